use std::thread;
use std::time::{Duration, Instant};

use processor::{format_history, Dispatch, Processor};
use scheduler::{Config, Instruction, Policy};

mod round_robin;
mod sleep;

/// Compares the formatted dispatch history against `expected`.
fn run(folder: &str, name: &str, expected: &str, history: &[Dispatch]) {
    let output = format_history(history);

    println!("\n{folder}::{name}\nleft = Correct Output\nright = Your Output\n");
    use pretty_assertions::assert_eq;
    assert_eq!(expected, output);
}

/// Polls `condition` until it holds or `timeout` runs out.
fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

fn configured(policy: Policy, quantum: usize, num_cores: usize) -> Processor {
    let config = Config {
        num_cores,
        policy,
        quantum,
        instruction_delay: Duration::ZERO,
        tick_interval: Duration::from_millis(10),
        ..Config::default()
    };
    match Processor::with_config(config) {
        Ok(processor) => processor,
        Err(err) => panic!("invalid test configuration: {err}"),
    }
}

/// `DECLARE x 0` followed by `n` increments of `x`.
fn counter(n: usize) -> Vec<Instruction> {
    let mut program = vec![Instruction::declare("x", 0)];
    program.extend((0..n).map(|_| Instruction::add("x", "x", 1)));
    program
}

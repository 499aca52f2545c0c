use core::module_path;
use std::time::Duration;

use function_name::named;
use scheduler::{Handoff, Instruction, Policy};

use super::{configured, counter, run, wait_until};

fn counter_then_print(n: usize) -> Vec<Instruction> {
    let mut program = counter(n);
    program.push(Instruction::print("x"));
    program
}

#[test]
#[named]
pub fn quantum_splits_dispatches() {
    let processor = configured(Policy::RoundRobin, 2, 1);
    processor.admit(processor.create_process_with(Some("counter"), counter_then_print(3)));

    while processor.step(0).is_some() {}

    run(
        module_path!().split("::").last().unwrap(),
        function_name!(),
        "core 0\tcounter (pid 1)\tran 2\t-> READY\n\
         core 0\tcounter (pid 1)\tran 2\t-> READY\n\
         core 0\tcounter (pid 1)\tran 1\t-> FINISHED\n",
        &processor.take_history(),
    );

    let view = processor.locate("counter").unwrap();
    assert_eq!(view.memory.get("x"), Some(&3));
    let logs: Vec<&str> = view.logs.iter().map(|entry| entry.text.as_str()).collect();
    assert_eq!(logs, vec!["3"]);
}

#[test]
#[named]
pub fn preempted_process_goes_to_the_back() {
    let processor = configured(Policy::RoundRobin, 3, 1);
    processor.admit(processor.create_process_with(Some("long"), counter(6)));
    processor.admit(processor.create_process_with(Some("short"), counter(1)));
    processor.admit(processor.create_process_with(Some("napper"), vec![Instruction::sleep(1)]));

    while processor.step(0).is_some() {}
    processor.tick();
    while processor.step(0).is_some() {}

    run(
        module_path!().split("::").last().unwrap(),
        function_name!(),
        "core 0\tlong (pid 1)\tran 3\t-> READY\n\
         core 0\tshort (pid 2)\tran 2\t-> FINISHED\n\
         core 0\tnapper (pid 3)\tran 1\t-> SLEEPING\n\
         core 0\tlong (pid 1)\tran 3\t-> READY\n\
         core 0\tlong (pid 1)\tran 1\t-> FINISHED\n\
         core 0\tnapper (pid 3)\tran 0\t-> FINISHED\n",
        &processor.take_history(),
    );
}

#[test]
pub fn no_dispatch_exceeds_the_quantum() {
    let processor = configured(Policy::RoundRobin, 2, 3);
    for i in 0..8 {
        processor.admit(processor.create_process_with(Some(format!("p{i}").as_str()), counter_then_print(i + 2)));
    }
    processor.start().unwrap();

    let done = wait_until(Duration::from_secs(5), || processor.snapshot().finished.len() == 8);
    processor.stop();
    assert!(done);

    let history = processor.take_history();
    assert!(history.iter().all(|dispatch| dispatch.executed <= 2));
    for i in 0..8 {
        let name = format!("p{i}");
        let view = processor.locate(&name).unwrap();
        assert_eq!(view.memory.get("x"), Some(&(i as u16 + 2)));

        let executed: usize = history
            .iter()
            .filter(|dispatch| dispatch.name == name)
            .map(|dispatch| dispatch.executed)
            .sum();
        assert_eq!(executed, view.info.len);
        let finished = history
            .iter()
            .filter(|dispatch| dispatch.name == name && dispatch.handoff == Handoff::Finished)
            .count();
        assert_eq!(finished, 1);
    }
}

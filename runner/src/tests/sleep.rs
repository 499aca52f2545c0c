use std::time::Duration;

use scheduler::{Instruction, Policy, ProcessState};

use super::{configured, wait_until};

fn sleeper(ticks: u16) -> Vec<Instruction> {
    vec![
        Instruction::declare("x", 0),
        Instruction::add("x", "x", 1),
        Instruction::sleep(ticks),
        Instruction::add("x", "x", 1),
    ]
}

#[test]
pub fn sleeps_for_exactly_its_ticks() {
    let processor = configured(Policy::RoundRobin, 5, 1);
    processor.admit(processor.create_process_with(Some("s"), sleeper(3)));

    let dispatch = processor.step(0).unwrap();
    assert_eq!(dispatch.executed, 3);
    assert_eq!(processor.locate("s").unwrap().info.state, ProcessState::Sleeping { remaining: 3 });

    processor.tick();
    processor.tick();
    assert_eq!(processor.locate("s").unwrap().info.state, ProcessState::Sleeping { remaining: 1 });
    assert_eq!(processor.step(0), None);

    processor.tick();
    assert_eq!(processor.locate("s").unwrap().info.state, ProcessState::Ready);

    assert_eq!(processor.step(0).unwrap().executed, 1);
    let view = processor.locate("s").unwrap();
    assert_eq!(view.info.state, ProcessState::Finished);
    assert_eq!(view.memory.get("x"), Some(&2));
}

#[test]
pub fn sleep_zero_does_not_yield() {
    let processor = configured(Policy::Fcfs, 1, 1);
    processor.admit(processor.create_process_with(Some("s"), sleeper(0)));

    let dispatch = processor.step(0).unwrap();
    assert_eq!(dispatch.executed, 4);
    assert_eq!(processor.locate("s").unwrap().info.state, ProcessState::Finished);
}

#[test]
pub fn wakers_keep_their_order() {
    let processor = configured(Policy::Fcfs, 1, 1);
    for (name, ticks) in [("a", 2), ("b", 1), ("c", 2)] {
        processor.admit(processor.create_process_with(Some(name), vec![Instruction::sleep(ticks)]));
    }
    while processor.step(0).is_some() {}
    assert_eq!(processor.snapshot().sleeping.len(), 3);

    processor.tick();
    processor.tick();

    let ready: Vec<String> = processor.snapshot().ready.into_iter().map(|info| info.name).collect();
    assert_eq!(ready, vec!["b".to_string(), "a".to_string(), "c".to_string()]);
    assert!(processor.snapshot().sleeping.is_empty());
}

#[test]
pub fn tick_thread_wakes_sleepers() {
    let processor = configured(Policy::Fcfs, 1, 1);
    processor.admit(processor.create_process_with(Some("s"), sleeper(2)));
    processor.start().unwrap();

    let done = wait_until(Duration::from_secs(5), || {
        processor.locate("s").map(|view| view.info.state) == Some(ProcessState::Finished)
    });
    processor.stop();
    assert!(done);
    assert!(processor.ticks() >= 2);
}

// Scenario tests for the minikernel scheduler
use crate::config::{SchedConfig, INIT_PID, REG_ARG1, REG_SYSCALL};
use crate::hal::{Interrupt, InterruptLevel};
use crate::process::pcb::{ProcessState, QueueId};
use crate::syscalls::SyscallNumber;
use crate::testing::{booted, spawn, syscall, MockHal};
use crate::{Kernel, Transfer};

/// Structural invariants that must hold between any two operations
fn assert_invariants(kernel: &Kernel<MockHal>) {
    let ready: Vec<_> = kernel.queue_order(QueueId::Ready).collect();
    for pair in ready.windows(2) {
        assert!(
            kernel.table[pair[0]].effective_priority >= kernel.table[pair[1]].effective_priority,
            "ready queue out of order: {:?}",
            ready
        );
    }

    for pcb in kernel.table.iter_live() {
        assert_eq!(
            pcb.children,
            kernel.table.count_children(pcb.id),
            "children count of PID {}",
            pcb.id
        );
        let expected = match pcb.state {
            ProcessState::Ready | ProcessState::Running => Some(QueueId::Ready),
            ProcessState::Blocked => pcb.queue(),
            _ => None,
        };
        assert!(pcb.queue().is_some(), "PID {} is in no queue", pcb.id);
        assert_eq!(pcb.queue(), expected);
    }

    let running = kernel
        .table
        .iter()
        .filter(|pcb| pcb.state == ProcessState::Running)
        .count();
    assert_eq!(running, 1);
}

fn set_registers(kernel: &mut Kernel<MockHal>, number: SyscallNumber, arg: usize) {
    kernel.hal.registers[REG_SYSCALL] = number as usize;
    kernel.hal.registers[REG_ARG1] = arg;
}

#[test]
fn creating_from_priority_ten_halves_both() {
    let mut kernel = booted();
    kernel.set_base_priority(0, 10).expect("valid priority");
    kernel.table[0].effective_priority = 10;
    kernel.reorder(0);

    let child = syscall(&mut kernel, SyscallNumber::Create as usize, &[5]) as usize;

    assert_eq!(kernel.table[0].effective_priority, 5);
    assert_eq!(kernel.table[child].effective_priority, 5);
    assert_invariants(&kernel);
}

#[test]
fn lowering_base_priority_hands_cpu_to_stronger_process() {
    let mut kernel = booted();
    let other = spawn(&mut kernel);
    kernel.table[0].base_priority = 10;
    kernel.table[0].effective_priority = 8;
    kernel.reorder(0);
    kernel.table[other].effective_priority = 6;
    kernel.reorder(other);
    assert_eq!(kernel.current(), Some(0));

    assert_eq!(syscall(&mut kernel, SyscallNumber::SetPriority as usize, &[5]), 0);

    assert_eq!(kernel.table[0].effective_priority, 4);
    assert!(kernel.is_reschedule_pending());
    let transfer = kernel.dispatch(Interrupt::Software);
    assert_eq!(transfer, Transfer::SwitchTo { from: Some(0), to: other });
    assert_invariants(&kernel);
}

#[test]
fn parent_waits_for_child_and_gets_bonus() {
    let mut kernel = booted();
    kernel.set_base_priority(0, 30).expect("valid priority");
    kernel.table[0].effective_priority = 30;
    kernel.reorder(0);
    let child = spawn(&mut kernel);

    assert_eq!(syscall(&mut kernel, SyscallNumber::WaitChildren as usize, &[]), 0);
    assert_eq!(kernel.current(), Some(child));
    assert_eq!(kernel.table[0].queue(), Some(QueueId::Waiting));
    assert_invariants(&kernel);

    set_registers(&mut kernel, SyscallNumber::Terminate, 0);
    let transfer = kernel.dispatch(Interrupt::Syscall);

    assert_eq!(transfer, Transfer::SwitchTo { from: Some(child), to: 0 });
    // 15 * 1.1 = 16.5, truncated
    assert_eq!(kernel.table[0].effective_priority, 16);
    assert_eq!(kernel.table[child].state, ProcessState::Unused);
    assert_invariants(&kernel);
}

#[test]
fn grandchildren_move_to_init_when_parent_exits() {
    let mut kernel = booted();
    let middle = spawn(&mut kernel);
    syscall(&mut kernel, SyscallNumber::Sleep as usize, &[1]);
    assert_eq!(kernel.current(), Some(middle));

    let a = syscall(&mut kernel, SyscallNumber::Create as usize, &[2]) as usize;
    let b = syscall(&mut kernel, SyscallNumber::Create as usize, &[3]) as usize;
    assert_invariants(&kernel);

    set_registers(&mut kernel, SyscallNumber::Terminate, 0);
    kernel.dispatch(Interrupt::Syscall);

    assert_eq!(kernel.table[a].parent, Some(INIT_PID));
    assert_eq!(kernel.table[b].parent, Some(INIT_PID));
    assert_eq!(kernel.table[INIT_PID].children, 2);
    assert_invariants(&kernel);
}

#[test]
fn sleeping_process_returns_after_exactly_its_ticks() {
    let mut kernel = booted();
    let worker = spawn(&mut kernel);
    assert_eq!(syscall(&mut kernel, SyscallNumber::Sleep as usize, &[1]), 0);
    assert_eq!(kernel.current(), Some(worker));

    let mut woke_at = None;
    for tick in 1..=150 {
        kernel.dispatch(Interrupt::Timer);
        if kernel.pcb(0).map(|pcb| pcb.state) != Some(ProcessState::Blocked) {
            woke_at = Some(tick);
            break;
        }
    }

    assert_eq!(woke_at, Some(100));
    assert_invariants(&kernel);
}

#[test]
fn aging_alternates_equal_processes() {
    let mut kernel = booted();
    let other = spawn(&mut kernel);
    let mut order = Vec::new();

    for _ in 0..4 {
        kernel.dispatch(Interrupt::Timer);
        if kernel.is_reschedule_pending() {
            kernel.dispatch(Interrupt::Software);
        }
        order.push(kernel.current().expect("running process"));
        assert_invariants(&kernel);
    }

    assert_eq!(order, vec![other, 0, other, 0]);
}

#[test]
fn idle_services_terminal_and_timer() {
    let mut kernel = Kernel::with_config(
        MockHal::new(),
        SchedConfig {
            ticks_per_second: 1,
            ..Default::default()
        },
    );
    kernel.boot(0).expect("init boots");
    kernel.hal.idle_events.extend([Interrupt::Terminal, Interrupt::Timer]);

    let transfer = kernel.sleep(1).expect("running process");

    assert_eq!(transfer, Transfer::Continue);
    assert_eq!(kernel.hal.halts, 2);
    assert_eq!(kernel.hal.ports_read.len(), 1);
    assert_eq!(kernel.current(), Some(0));
    assert_invariants(&kernel);
}

#[test]
fn queue_mutations_run_fully_masked() {
    let mut kernel = booted();
    kernel.hal.level_log.clear();

    spawn(&mut kernel);

    assert!(!kernel.hal.level_log.is_empty());
    assert_eq!(kernel.hal.level_log.first(), Some(&InterruptLevel::All));
    assert_eq!(kernel.hal.level, InterruptLevel::Software);
}

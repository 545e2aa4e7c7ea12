// Scripted hardware layer for host tests
use std::collections::VecDeque;

use crate::config::{REG_ARG1, REG_SYSCALL};
use crate::hal::{Cpu, Hal, Interrupt, InterruptLevel, ProgramRef};
use crate::kernel::Kernel;
use crate::process::Pid;

/// Program reference the mock image builder refuses
pub const BAD_PROGRAM: ProgramRef = usize::MAX;

pub const INIT_PROGRAM: ProgramRef = 0;

#[derive(Debug, PartialEq, Eq)]
pub struct MockImage(pub ProgramRef);

#[derive(Debug, PartialEq, Eq)]
pub struct MockStack(pub usize);

#[derive(Debug, PartialEq, Eq)]
pub struct MockContext {
    pub id: usize,
    pub entry: usize,
    /// Times this context was saved by an outgoing switch
    pub saves: usize,
}

pub struct MockHal {
    pub level: InterruptLevel,
    pub level_log: Vec<InterruptLevel>,
    pub idle_events: VecDeque<Interrupt>,
    /// Returned by `halt_cpu` once `idle_events` runs dry
    pub idle_default: Option<Interrupt>,
    pub halts: usize,
    pub soft_irqs: usize,
    /// (saved context id, restored context id) per switch
    pub switches: Vec<(Option<usize>, usize)>,
    pub registers: [usize; 8],
    pub user_mode: bool,
    pub terminal_byte: u8,
    pub ports_read: Vec<u16>,
    pub written: Vec<(usize, usize)>,
    pub live_images: usize,
    pub live_stacks: usize,
    next_context: usize,
}

impl MockHal {
    pub fn new() -> Self {
        Self {
            level: InterruptLevel::Software,
            level_log: Vec::new(),
            idle_events: VecDeque::new(),
            idle_default: None,
            halts: 0,
            soft_irqs: 0,
            switches: Vec::new(),
            registers: [0; 8],
            user_mode: true,
            terminal_byte: 0,
            ports_read: Vec::new(),
            written: Vec::new(),
            live_images: 0,
            live_stacks: 0,
            next_context: 0,
        }
    }
}

impl Default for MockHal {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu for MockHal {
    fn set_interrupt_level(&mut self, level: InterruptLevel) -> InterruptLevel {
        self.level_log.push(level);
        core::mem::replace(&mut self.level, level)
    }

    fn halt_cpu(&mut self) -> Option<Interrupt> {
        assert_eq!(self.level, InterruptLevel::Software, "halted with interrupts masked");
        self.halts += 1;
        let event = self.idle_events.pop_front().or(self.idle_default);
        assert!(event.is_some(), "idle with no interrupt scripted");
        event
    }

    fn raise_software_interrupt(&mut self) {
        self.soft_irqs += 1;
    }

    fn read_port(&mut self, port: u16) -> u8 {
        self.ports_read.push(port);
        self.terminal_byte
    }

    fn from_user_mode(&self) -> bool {
        self.user_mode
    }
}

impl Hal for MockHal {
    type Image = MockImage;
    type Stack = MockStack;
    type Context = MockContext;

    fn build_image(&mut self, program: ProgramRef) -> Option<(MockImage, usize)> {
        if program == BAD_PROGRAM {
            return None;
        }
        self.live_images += 1;
        Some((MockImage(program), 0x1000 + program))
    }

    fn release_image(&mut self, _image: MockImage) {
        self.live_images -= 1;
    }

    fn allocate_stack(&mut self, size: usize) -> MockStack {
        self.live_stacks += 1;
        MockStack(size)
    }

    fn release_stack(&mut self, _stack: MockStack) {
        self.live_stacks -= 1;
    }

    fn init_context(
        &mut self,
        _image: &MockImage,
        _stack: &MockStack,
        _stack_size: usize,
        entry: usize,
    ) -> MockContext {
        self.next_context += 1;
        MockContext {
            id: self.next_context,
            entry,
            saves: 0,
        }
    }

    fn switch_context(&mut self, from: Option<&mut MockContext>, to: &MockContext) {
        let saved = from.map(|ctx| {
            ctx.saves += 1;
            ctx.id
        });
        self.switches.push((saved, to.id));
    }

    fn read_register(&self, index: usize) -> usize {
        self.registers[index]
    }

    fn write_register(&mut self, index: usize, value: usize) {
        self.registers[index] = value;
    }

    fn write_text(&mut self, addr: usize, len: usize) {
        self.written.push((addr, len));
    }
}

/// Kernel booted into the init process
pub fn booted() -> Kernel<MockHal> {
    let mut kernel = Kernel::new(MockHal::new());
    kernel.boot(INIT_PROGRAM).expect("init boots");
    kernel
}

/// Create a child of the current process
pub fn spawn(kernel: &mut Kernel<MockHal>) -> Pid {
    kernel.create(1).expect("free slot")
}

/// Issue a syscall from the current process and return the result register
pub fn syscall(kernel: &mut Kernel<MockHal>, number: usize, args: &[usize]) -> isize {
    kernel.hal.registers[REG_SYSCALL] = number;
    for (offset, &arg) in args.iter().enumerate() {
        kernel.hal.registers[REG_ARG1 + offset] = arg;
    }
    kernel.dispatch(Interrupt::Syscall);
    kernel.hal.registers[REG_SYSCALL] as isize
}

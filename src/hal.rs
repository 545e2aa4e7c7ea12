// Hardware abstraction layer consumed by the scheduler core

/// Interrupt masking levels. Raising to a level masks every source at or below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum InterruptLevel {
    /// Only software interrupts masked; used while idling
    Software = 1,
    /// Terminal and software interrupts masked
    Terminal = 2,
    /// Everything masked
    All = 3,
}

/// Interrupt and exception sources delivered to the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Timer,
    Terminal,
    Software,
    Syscall,
    ArithmeticFault,
    MemoryFault,
}

/// Opaque reference to a program the image builder can load
pub type ProgramRef = usize;

/// CPU control primitives
pub trait Cpu {
    /// Set the masking level, returning the previous one
    fn set_interrupt_level(&mut self, level: InterruptLevel) -> InterruptLevel;

    /// Halt until an interrupt arrives. Returns the interrupt that woke the
    /// CPU when the platform delivers it to the caller instead of a handler.
    fn halt_cpu(&mut self) -> Option<Interrupt>;

    fn raise_software_interrupt(&mut self);

    fn read_port(&mut self, port: u16) -> u8;

    /// Whether the interrupted code was running in user mode
    fn from_user_mode(&self) -> bool;
}

/// Memory, context and register services for process management
pub trait Hal: Cpu {
    type Image;
    type Stack;
    type Context;

    /// Build an executable image, returning it with its entry point
    fn build_image(&mut self, program: ProgramRef) -> Option<(Self::Image, usize)>;
    fn release_image(&mut self, image: Self::Image);

    fn allocate_stack(&mut self, size: usize) -> Self::Stack;
    fn release_stack(&mut self, stack: Self::Stack);

    fn init_context(
        &mut self,
        image: &Self::Image,
        stack: &Self::Stack,
        stack_size: usize,
        entry: usize,
    ) -> Self::Context;

    /// Transfer the CPU to `to`. With `from = None` the outgoing state is discarded.
    fn switch_context(&mut self, from: Option<&mut Self::Context>, to: &Self::Context);

    fn read_register(&self, index: usize) -> usize;
    fn write_register(&mut self, index: usize, value: usize);

    /// Print `len` bytes of the current process's memory starting at `addr`
    fn write_text(&mut self, addr: usize, len: usize);
}

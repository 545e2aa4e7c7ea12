// x86_64 CPU adapter: interrupt levels via the 8259 PICs
use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use pic8259::ChainedPics;
use spin::Mutex;
use ::x86_64::instructions::{self, interrupts, port::Port};
use ::x86_64::structures::gdt::SegmentSelector;
use ::x86_64::PrivilegeLevel;

use crate::hal::{Cpu, Interrupt, InterruptLevel};

pub const PIC_1_OFFSET: u8 = 32;
pub const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;

// IRQ lines on the primary PIC
const TIMER_IRQ: u8 = 0;
const TERMINAL_IRQ: u8 = 1;

pub static PICS: Mutex<ChainedPics> =
    Mutex::new(unsafe { ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET) });

static LEVEL: AtomicU8 = AtomicU8::new(InterruptLevel::All as u8);
static SOFTWARE_PENDING: AtomicBool = AtomicBool::new(false);
/// Interrupt latched by an IRQ stub while the kernel was idle, 0 when none
static LATCHED: AtomicU8 = AtomicU8::new(0);
/// Code segment of the most recently interrupted frame
static FRAME_CS: AtomicU16 = AtomicU16::new(0);

/// PIC masks (primary, secondary) for a level. A set bit masks the line.
pub fn pic_masks(level: InterruptLevel) -> (u8, u8) {
    let open = match level {
        InterruptLevel::Software => (1 << TIMER_IRQ) | (1 << TERMINAL_IRQ),
        InterruptLevel::Terminal => 1 << TIMER_IRQ,
        InterruptLevel::All => 0,
    };
    (!open, 0xff)
}

/// Whether a code segment selector belongs to ring 3
pub fn is_user_selector(cs: u16) -> bool {
    SegmentSelector(cs).rpl() == PrivilegeLevel::Ring3
}

fn level_from_u8(raw: u8) -> InterruptLevel {
    match raw {
        1 => InterruptLevel::Software,
        2 => InterruptLevel::Terminal,
        _ => InterruptLevel::All,
    }
}

fn latch_code(interrupt: Interrupt) -> u8 {
    match interrupt {
        Interrupt::Timer => 1,
        Interrupt::Terminal => 2,
        Interrupt::Software => 3,
        Interrupt::Syscall => 4,
        Interrupt::ArithmeticFault => 5,
        Interrupt::MemoryFault => 6,
    }
}

fn from_latch_code(code: u8) -> Option<Interrupt> {
    match code {
        1 => Some(Interrupt::Timer),
        2 => Some(Interrupt::Terminal),
        3 => Some(Interrupt::Software),
        4 => Some(Interrupt::Syscall),
        5 => Some(Interrupt::ArithmeticFault),
        6 => Some(Interrupt::MemoryFault),
        _ => None,
    }
}

/// Bare-metal CPU control
pub struct X86Cpu;

impl X86Cpu {
    /// Remap the PICs and start fully masked
    pub fn init() -> Self {
        unsafe { PICS.lock().initialize() };
        let mut cpu = X86Cpu;
        cpu.set_interrupt_level(InterruptLevel::All);
        crate::serial_println!("[BOOT] PICs remapped to {}/{}", PIC_1_OFFSET, PIC_2_OFFSET);
        cpu
    }

    /// Called by IRQ stubs that fire while the kernel is halted
    pub fn latch(interrupt: Interrupt) {
        LATCHED.store(latch_code(interrupt), Ordering::SeqCst);
    }

    /// Called by interrupt entry stubs with the interrupted frame's CS
    pub fn record_frame(cs: u16) {
        FRAME_CS.store(cs, Ordering::SeqCst);
    }

    /// Consume a software interrupt raised since the last check.
    /// Entry stubs poll this on the way back to user mode.
    pub fn take_software_interrupt() -> bool {
        SOFTWARE_PENDING.swap(false, Ordering::SeqCst)
    }

    pub fn end_of_interrupt(irq: u8) {
        unsafe { PICS.lock().notify_end_of_interrupt(PIC_1_OFFSET + irq) };
    }
}

impl Cpu for X86Cpu {
    fn set_interrupt_level(&mut self, level: InterruptLevel) -> InterruptLevel {
        let previous = level_from_u8(LEVEL.swap(level as u8, Ordering::SeqCst));
        let (primary, secondary) = pic_masks(level);

        interrupts::disable();
        unsafe { PICS.lock().write_masks(primary, secondary) };
        if level != InterruptLevel::All {
            interrupts::enable();
        }
        previous
    }

    fn halt_cpu(&mut self) -> Option<Interrupt> {
        if let Some(pending) = from_latch_code(LATCHED.swap(0, Ordering::SeqCst)) {
            return Some(pending);
        }
        instructions::hlt();
        from_latch_code(LATCHED.swap(0, Ordering::SeqCst))
    }

    fn raise_software_interrupt(&mut self) {
        SOFTWARE_PENDING.store(true, Ordering::SeqCst);
    }

    fn read_port(&mut self, port: u16) -> u8 {
        let mut port = Port::<u8>::new(port);
        unsafe { port.read() }
    }

    fn from_user_mode(&self) -> bool {
        is_user_selector(FRAME_CS.load(Ordering::SeqCst))
    }
}

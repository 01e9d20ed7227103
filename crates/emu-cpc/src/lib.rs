//! Amstrad CPC 464/6128 peripheral emulation.
//!
//! Everything around the Z80: banked memory with ROM overlays, the gate
//! array (palette, screen mode, raster interrupt), the 6845 CRTC, the 8255
//! PPI with the keyboard matrix behind it, the AY-3-8910 sound chip and a
//! monitor that turns the CRTC beam into a 640x200 framebuffer. The
//! processor is supplied by the host through [`emu_core::Cpu`]; the machine
//! runs at 3,993,600 T-states per second with one peripheral clock every
//! four T-states.

pub mod audio;
mod bus;
mod config;
mod cpc;
pub mod framebuffer;
mod gate_array;
pub mod input;
pub mod io;
mod keyboard;
pub mod memory;
mod monitor;
pub mod palette;
mod registers;
pub mod sna;
#[cfg(any(test, feature = "test-utils"))]
mod stub_cpu;

pub use audio::AudioQueue;
pub use bus::{CpcBus, SyncListener};
pub use config::{CpcConfig, RamSize};
pub use cpc::{Cpc, FRAMES_PER_SECOND, TIMING, TSTATES_PER_CLOCK, TSTATES_PER_FRAME, TSTATES_PER_SECOND};
pub use framebuffer::{FrameBuffers, FrameState};
pub use gate_array::GateArray;
pub use input::{CpcKey, JoystickButton};
pub use keyboard::KeyboardMatrix;
pub use memory::Memory;
pub use monitor::Monitor;
pub use registers::Z80Registers;
pub use sna::{SnaError, load_sna};
#[cfg(any(test, feature = "test-utils"))]
pub use stub_cpu::StubCpu;

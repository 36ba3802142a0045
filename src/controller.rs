//! The transfer controller: the single-threaded control loop that owns the
//! engine and both buffers and walks every transfer through the same cycle.
//!
//! One cycle:
//!
//! 1. wait for a button edge (trigger flag)
//! 2. zero the destination and arm the engine
//! 3. clear the completion flag, then fire the software trigger
//! 4. wait for the completion flag
//! 5. verify destination against source, report, drop coalesced edges
//!
//! Step 3's order is load-bearing. The completion interrupt can preempt the
//! loop the moment the trigger is issued; clearing the flag after the
//! trigger could wipe a completion that already happened and leave the loop
//! waiting for an event that never comes again.

use core::convert::Infallible;
use core::ptr;
use core::slice;
use core::sync::atomic::{self, Ordering};

use embedded_hal::delay::DelayNs;

use crate::descriptor::{ElementWidth, TransferDescriptor};
use crate::engine::TransferEngine;
use crate::flag::TransferSignals;
use crate::traits::{DestinationBuffer, SourceBuffer};
use crate::verify::verify;
use crate::Error;

/// Tuning knobs for the control loop.
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    poll_interval_us: u32,
    width: ElementWidth,
}

impl ControllerConfig {
    /// How long the loop sleeps between flag polls.
    #[inline(always)]
    pub fn poll_interval_us(mut self, poll_interval_us: u32) -> Self {
        self.poll_interval_us = poll_interval_us;
        self
    }

    /// Width of one transferred element.
    #[inline(always)]
    pub fn element_width(mut self, width: ElementWidth) -> Self {
        self.width = width;
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval_us: 1_000,
            width: ElementWidth::Bits32,
        }
    }
}

/// Outcome of one verified transfer cycle, borrowed from the controller.
#[derive(Debug)]
pub struct CycleReport<'a> {
    /// The bytes that were read.
    pub source: &'a [u8],
    /// The bytes that were written. Verified equal to `source`.
    pub destination: &'a [u8],
    /// Element width of the transfer.
    pub width: ElementWidth,
}

impl CycleReport<'_> {
    /// Number of elements moved.
    pub fn elements(&self) -> usize {
        self.source.len() / self.width.bytes()
    }
}

/// Owns the engine, the buffers and the reader side of the signal flags.
///
/// The buffers are required to be `'static`: the engine holds raw pointers
/// into them while a transfer is in flight, and nothing stops a caller from
/// leaking the controller mid-transfer, so the memory must stay valid
/// forever.
pub struct TransferController<'s, R, W, E, D>
where
    E: TransferEngine,
{
    engine: E,
    delay: D,
    signals: &'s TransferSignals,
    descriptor: TransferDescriptor,
    config: ControllerConfig,
    src: R,
    dst: W,
}

impl<'s, R, W, E, D> TransferController<'s, R, W, E, D>
where
    R: SourceBuffer + 'static,
    W: DestinationBuffer + 'static,
    E: TransferEngine,
    D: DelayNs,
{
    /// Validates the buffers against `config`, performs one-time channel
    /// setup and returns the controller, ready for [`run`](Self::run).
    ///
    /// Any configuration the engine or the descriptor rejects surfaces here
    /// as [`Error::Config`]; nothing is retried.
    pub fn new(
        mut engine: E,
        src: R,
        mut dst: W,
        signals: &'s TransferSignals,
        delay: D,
        config: ControllerConfig,
    ) -> Result<Self, Error> {
        let descriptor = TransferDescriptor::from_regions(
            src.source_region(),
            dst.destination_region(),
            config.width,
        )?;
        engine.init_channel()?;
        Ok(Self {
            engine,
            delay,
            signals,
            descriptor,
            config,
            src,
            dst,
        })
    }

    /// Runs transfer cycles forever, invoking `report` after each verified
    /// transfer. Returns only on a fatal error; the caller decides how to
    /// halt.
    pub fn run<F>(&mut self, mut report: F) -> Result<Infallible, Error>
    where
        F: FnMut(&CycleReport<'_>),
    {
        loop {
            let cycle = self.run_once()?;
            report(&cycle);
        }
    }

    /// Runs exactly one cycle: wait for a trigger, transfer, verify.
    pub fn run_once(&mut self) -> Result<CycleReport<'_>, Error> {
        self.wait_for_trigger();
        self.arm()?;
        self.trigger()?;
        self.wait_for_completion()?;
        self.finish()
    }

    /// Blocks until a button edge has been observed.
    ///
    /// Stale state from the previous cycle is reset first, so only an edge
    /// arriving from here on starts a transfer.
    fn wait_for_trigger(&mut self) {
        self.signals.trigger.clear();
        self.signals.complete.clear();
        self.signals
            .trigger
            .wait_with_backoff(&mut self.delay, self.config.poll_interval_us);
    }

    /// Zeroes the destination and arms the engine.
    ///
    /// The zeroing gives verification a known-bad baseline: an engine that
    /// silently moves nothing leaves zeroes behind and cannot pass as a
    /// successful copy.
    fn arm(&mut self) -> Result<(), Error> {
        let (dst_ptr, dst_len) = self.dst.destination_region();
        // Safety: the controller owns the buffer and the engine is not
        // running yet; nothing else aliases it.
        unsafe { ptr::write_bytes(dst_ptr, 0, dst_len) };
        self.engine.set_descriptor(&self.descriptor)?;
        self.engine.enable();
        Ok(())
    }

    /// Clears the completion flag, then fires the software trigger.
    fn trigger(&mut self) -> Result<(), Error> {
        self.signals.complete.clear();
        // The zeroed destination and the cleared flag must be in place
        // before the engine can observe the trigger.
        atomic::compiler_fence(Ordering::Release);
        self.engine.software_trigger()?;
        Ok(())
    }

    /// Blocks until the completion interrupt reports success, then stops
    /// the channel.
    ///
    /// A fault latched by the engine interrupt handler ends the wait
    /// immediately; there is no timeout otherwise.
    fn wait_for_completion(&mut self) -> Result<(), Error> {
        loop {
            if let Some(status) = self.signals.fault.take() {
                return Err(Error::UnexpectedIrq(status));
            }
            if self.signals.complete.read() {
                break;
            }
            self.delay.delay_us(self.config.poll_interval_us);
        }
        self.engine.disable();
        atomic::compiler_fence(Ordering::Acquire);
        Ok(())
    }

    /// Verifies the copy and closes out the cycle.
    ///
    /// Button edges that arrived while the transfer was in flight are
    /// dropped here; a request observed mid-transfer coalesces into the
    /// transfer already running instead of queueing another one.
    fn finish(&mut self) -> Result<CycleReport<'_>, Error> {
        let len = self.descriptor.byte_len();
        let (src_ptr, _) = self.src.source_region();
        let (dst_ptr, _) = self.dst.destination_region();
        // Safety: both regions are live for as long as the controller is,
        // the engine is disabled, and the Acquire fence in
        // `wait_for_completion` ordered its writes before these reads.
        let source = unsafe { slice::from_raw_parts(src_ptr, len) };
        let destination = unsafe { slice::from_raw_parts(dst_ptr as *const u8, len) };
        verify(source, destination, self.descriptor.width())?;
        self.signals.trigger.clear();
        Ok(CycleReport {
            source,
            destination,
            width: self.descriptor.width(),
        })
    }
}

impl<'s, R, W, E, D> Drop for TransferController<'s, R, W, E, D>
where
    E: TransferEngine,
{
    fn drop(&mut self) {
        self.engine.disable();
        atomic::compiler_fence(Ordering::Acquire);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_the_demo_setup() {
        let config = ControllerConfig::default();
        assert_eq!(config.poll_interval_us, 1_000);
        assert_eq!(config.width, ElementWidth::Bits32);
    }

    #[test]
    fn config_builder_overrides_defaults() {
        let config = ControllerConfig::default()
            .poll_interval_us(250)
            .element_width(ElementWidth::Bits8);
        assert_eq!(config.poll_interval_us, 250);
        assert_eq!(config.width, ElementWidth::Bits8);
    }

    #[test]
    fn report_counts_elements_by_width() {
        let bytes = [0u8; 24];
        let report = CycleReport {
            source: &bytes,
            destination: &bytes,
            width: ElementWidth::Bits16,
        };
        assert_eq!(report.elements(), 12);
    }
}

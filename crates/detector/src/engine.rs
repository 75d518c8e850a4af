//! Consumer-thread engine
//!
//! One cooperative cycle: drain the update ring into the registry, scan,
//! yield the ranked opportunities, reset the scratch arena. Producers run
//! on other threads; the ring is the only cross-thread hand-off. Logging
//! happens at cycle granularity only — the per-pool paths stay silent and
//! report through counters.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use dexarb_core::{ArbitrageOpportunity, CoreResult, EngineConfig, PriceUpdate, ScannerConfig};
use dexarb_runtime::{Arena, Consumer};

use crate::scanner::OpportunityScanner;

/// Per-engine counters, readable between cycles.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    pub cycles: u64,
    pub updates_drained: u64,
    pub updates_dropped: u64,
    pub opportunities_found: u64,
}

/// Owns the consumer side of the ring, the scanner and the cycle arena.
pub struct Engine {
    consumer: Consumer<PriceUpdate>,
    scanner: OpportunityScanner,
    arena: Arena,
    config: EngineConfig,
    stats: EngineStats,
}

impl Engine {
    pub fn new(
        consumer: Consumer<PriceUpdate>,
        scanner_config: ScannerConfig,
        config: EngineConfig,
    ) -> CoreResult<Self> {
        scanner_config.validate()?;
        Ok(Self {
            consumer,
            scanner: OpportunityScanner::new(scanner_config),
            arena: Arena::new(config.arena_bytes)?,
            config,
            stats: EngineStats::default(),
        })
    }

    /// Run one cycle: drain, scan, yield, reset.
    pub fn run_cycle(&mut self) -> Vec<ArbitrageOpportunity> {
        let drained = self.drain_ring();

        let opportunities = self.scanner.scan();

        if self.config.reset_arena_each_cycle {
            self.arena.reset();
        }

        self.stats.cycles += 1;
        self.stats.opportunities_found += opportunities.len() as u64;
        debug!(
            drained,
            found = opportunities.len(),
            scan_ns = self.scanner.last_scan_ns(),
            "scan cycle complete"
        );
        opportunities
    }

    /// Drain up to the configured number of updates into the registry.
    ///
    /// Updates are staged into arena scratch first so a burst is applied
    /// from contiguous memory; when the arena cannot serve the slab the
    /// drain falls back to applying records one by one.
    fn drain_ring(&mut self) -> usize {
        let budget = self.config.max_drain_per_cycle;
        let mut drained = 0usize;
        let mut dropped = 0u64;

        if let Some(slab) = self.arena.alloc_slice_uninit::<PriceUpdate>(budget) {
            while drained < budget {
                match self.consumer.pop() {
                    Some(update) => {
                        slab[drained].write(update);
                        drained += 1;
                    }
                    None => break,
                }
            }
            for slot in &slab[..drained] {
                // Safety: exactly the first `drained` slots were written.
                let update = unsafe { slot.assume_init_ref() };
                if !self.scanner.apply_update(update) {
                    dropped += 1;
                }
            }
        } else {
            trace!(budget, "arena slab unavailable, applying updates directly");
            while drained < budget {
                match self.consumer.pop() {
                    Some(update) => {
                        if !self.scanner.apply_update(&update) {
                            dropped += 1;
                        }
                        drained += 1;
                    }
                    None => break,
                }
            }
        }

        if dropped > 0 {
            trace!(dropped, "updates dropped during drain");
        }
        self.stats.updates_drained += drained as u64;
        self.stats.updates_dropped += dropped;
        drained
    }

    /// Loop cycles until `shutdown` is raised, handing every opportunity
    /// to `sink`. Spin-yields between empty cycles.
    pub fn run(&mut self, shutdown: &AtomicBool, mut sink: impl FnMut(ArbitrageOpportunity)) {
        debug!("engine loop starting");
        while !shutdown.load(Ordering::Acquire) {
            let opportunities = self.run_cycle();
            for opportunity in opportunities {
                sink(opportunity);
            }
            std::thread::yield_now();
        }
        debug!(cycles = self.stats.cycles, "engine loop stopped");
    }

    pub fn scanner(&self) -> &OpportunityScanner {
        &self.scanner
    }

    pub fn scanner_mut(&mut self) -> &mut OpportunityScanner {
        &mut self.scanner
    }

    /// Scratch arena for collaborator per-cycle allocations. Reset at the
    /// end of each cycle when so configured.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }
}

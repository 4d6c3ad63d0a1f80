//! Resumable population: turns a finished layout into spawn requests a bounded
//! number at a time, so a large layout can be drained across several frames.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::EntityTag;
use crate::decoration::Decoration;
use crate::layout::BoatPathLayout;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulateConfig {
    /// Entries processed per [`LayoutPopulator::step`] call.
    pub entries_per_step: usize,
}

impl Default for PopulateConfig {
    fn default() -> Self {
        Self {
            entries_per_step: 64,
        }
    }
}

/// Outcome of one population step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    /// Entries remain; call `step` again.
    More,
    /// Every entry has been emitted.
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnKind {
    Placement,
    Decoration,
}

/// A placement or decoration resolved to world space.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    pub tag: EntityTag,
    pub kind: SpawnKind,
    pub position: DVec3,
    /// Signed offset from the centerline along the path normal.
    pub lateral_offset: f64,
    /// Arc length along the sampled centerline.
    pub arc_length: f64,
    pub aggressiveness: Option<f64>,
    /// Index of the layout section the entry belongs to.
    pub section: usize,
}

#[derive(Clone, Debug)]
struct PendingEntry {
    tag: EntityTag,
    kind: SpawnKind,
    index: f64,
    range: [f64; 2],
    aggressiveness: Option<f64>,
    section: usize,
}

/// Walks a layout section by section, emitting each section's placements
/// (tags in order, placements by index) followed by its bank decorations.
///
/// Lateral positions inside a placement's range are drawn from a generator
/// seeded at construction, in emission order, so the output does not depend
/// on how the work is split into steps.
pub struct LayoutPopulator {
    layout: Arc<BoatPathLayout>,
    decorations: Arc<[Decoration]>,
    rng: ChaCha8Rng,
    pending: VecDeque<PendingEntry>,
    next_section: usize,
    next_decoration: usize,
    emitted: usize,
}

impl LayoutPopulator {
    /// `decorations` must be ordered by path index.
    pub fn new(layout: Arc<BoatPathLayout>, decorations: Arc<[Decoration]>, seed: u64) -> Self {
        Self {
            layout,
            decorations,
            rng: ChaCha8Rng::seed_from_u64(seed),
            pending: VecDeque::new(),
            next_section: 0,
            next_decoration: 0,
            emitted: 0,
        }
    }

    /// Total entries this populator will emit.
    pub fn total(&self) -> usize {
        self.layout.placement_count() + self.decorations.len()
    }

    /// Entries emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Whether every section has been consumed and nothing is queued.
    pub fn is_done(&self) -> bool {
        self.pending.is_empty() && self.next_section >= self.layout.sections.len()
    }

    /// Emits up to `budget` entries into `sink`.
    ///
    /// Exactly `min(budget, remaining)` entries are emitted. A zero budget
    /// makes no progress.
    pub fn step<F>(&mut self, budget: usize, sink: &mut F) -> StepStatus
    where
        F: FnMut(SpawnRequest),
    {
        let mut processed = 0;
        while processed < budget {
            if self.pending.is_empty() && !self.load_next_section() {
                break;
            }
            let Some(entry) = self.pending.pop_front() else {
                break;
            };
            sink(self.resolve(entry));
            self.emitted += 1;
            processed += 1;
        }

        if self.is_done() {
            StepStatus::Done
        } else {
            StepStatus::More
        }
    }

    /// Steps with `budget` until done. Returns the number of steps taken.
    pub fn run_to_completion<F>(&mut self, budget: usize, sink: &mut F) -> usize
    where
        F: FnMut(SpawnRequest),
    {
        let budget = budget.max(1);
        let mut steps = 0;
        loop {
            steps += 1;
            if self.step(budget, sink) == StepStatus::Done {
                return steps;
            }
        }
    }

    /// Queues the entries of the next section that has any. Returns `false`
    /// once every section has been consumed.
    fn load_next_section(&mut self) -> bool {
        let layout = Arc::clone(&self.layout);
        let sections = &layout.sections;
        while self.pending.is_empty() {
            let Some(block) = sections.get(self.next_section) else {
                return false;
            };
            let section = self.next_section;
            let is_last = section + 1 == sections.len();

            for (tag, placements) in &block.placements {
                for p in placements {
                    self.pending.push_back(PendingEntry {
                        tag: tag.clone(),
                        kind: SpawnKind::Placement,
                        index: p.index,
                        range: p.range,
                        aggressiveness: p.aggressiveness,
                        section,
                    });
                }
            }

            while let Some(d) = self.decorations.get(self.next_decoration) {
                if !is_last && d.index >= block.i_end as f64 {
                    break;
                }
                self.pending.push_back(PendingEntry {
                    tag: d.tag.clone(),
                    kind: SpawnKind::Decoration,
                    index: d.index,
                    range: [d.lateral, d.lateral],
                    aggressiveness: None,
                    section,
                });
                self.next_decoration += 1;
            }

            self.next_section += 1;
        }
        true
    }

    fn resolve(&mut self, entry: PendingEntry) -> SpawnRequest {
        let [lo, hi] = entry.range;
        let lateral = if hi > lo {
            self.rng.random_range(lo..=hi)
        } else {
            lo
        };
        let frame = self.layout.frame_at(entry.index);
        SpawnRequest {
            tag: entry.tag,
            kind: entry.kind,
            position: frame.position + frame.normal * lateral,
            lateral_offset: lateral,
            arc_length: frame.arc_length,
            aggressiveness: entry.aggressiveness,
            section: entry.section,
        }
    }
}

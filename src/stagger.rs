//! Staggered reveal of a group of items.
//!
//! When the container comes into view, item `i` is scheduled to reveal at
//! `delay + i * stagger_delay`. Leaving view before the sequence is done
//! cancels whatever has not fired yet unless the sequence is trigger-once.

use serde::{Deserialize, Serialize};

use crate::motion::{MotionContext, StyleProps, Tween, Variant, VariantName};
use crate::scheduler::{Scheduler, TaskGroup};
use crate::visibility::VisibilityOptions;

/// What happens to a non-trigger-once sequence when its container leaves view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeavePolicy {
    /// Cancel pending items and hide everything again.
    #[default]
    Reset,
    /// Cancel pending items but keep the ones already revealed. Re-entry
    /// continues with the remaining items.
    Pause,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaggerOptions {
    pub item_count: usize,
    pub stagger_delay_ms: u64,
    pub delay_ms: u64,
    pub trigger_once: bool,
    pub leave: LeavePolicy,
    pub threshold: f64,
    pub variant: VariantName,
}

impl Default for StaggerOptions {
    fn default() -> Self {
        Self {
            item_count: 0,
            stagger_delay_ms: 100,
            delay_ms: 0,
            trigger_once: true,
            leave: LeavePolicy::Reset,
            threshold: 0.1,
            variant: VariantName::FadeUp,
        }
    }
}

impl StaggerOptions {
    pub fn visibility(&self) -> VisibilityOptions {
        VisibilityOptions {
            threshold: self.threshold,
            trigger_once: self.trigger_once,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub struct StaggerSequencer {
    options: StaggerOptions,
    ctx: MotionContext,
    variant: Variant,
    /// Reveal timestamp per item; `None` while hidden.
    revealed_at: Vec<Option<u64>>,
    scheduler: Scheduler<usize>,
    pending: TaskGroup,
    active: bool,
}

impl StaggerSequencer {
    pub fn new(options: StaggerOptions, ctx: MotionContext) -> Self {
        Self {
            variant: options.variant.variant().for_context(&ctx),
            revealed_at: vec![None; options.item_count],
            options,
            ctx,
            scheduler: Scheduler::new(),
            pending: TaskGroup::new(),
            active: false,
        }
    }

    pub fn options(&self) -> &StaggerOptions {
        &self.options
    }

    pub fn item_count(&self) -> usize {
        self.revealed_at.len()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pending(&self) -> usize {
        self.scheduler.len()
    }

    pub fn revealed(&self, index: usize) -> bool {
        self.revealed_at.get(index).is_some_and(|at| at.is_some())
    }

    pub fn revealed_flags(&self) -> Vec<bool> {
        self.revealed_at.iter().map(Option::is_some).collect()
    }

    pub fn all_revealed(&self) -> bool {
        self.revealed_at.iter().all(Option::is_some)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    /// React to the container entering or leaving view.
    pub fn on_visibility(&mut self, now_ms: u64, visible: bool) {
        if visible {
            self.start(now_ms);
        } else {
            self.leave();
        }
    }

    fn start(&mut self, now_ms: u64) {
        if self.active {
            return;
        }
        self.active = true;

        let hidden: Vec<usize> = (0..self.revealed_at.len())
            .filter(|i| self.revealed_at[*i].is_none())
            .collect();

        for (rank, index) in hidden.into_iter().enumerate() {
            let offset = self
                .options
                .delay_ms
                .saturating_add((rank as u64).saturating_mul(self.options.stagger_delay_ms));
            let delay = self.ctx.delay_ms(offset);
            self.pending.push(self.scheduler.schedule(now_ms, delay, index));
        }
    }

    fn leave(&mut self) {
        if !self.active || self.options.trigger_once {
            return;
        }
        self.active = false;
        self.pending.dispose(&mut self.scheduler);

        if self.options.leave == LeavePolicy::Reset {
            self.revealed_at.iter_mut().for_each(|at| *at = None);
        }
    }

    /// Fire due reveals and return the indices revealed, in order.
    pub fn advance(&mut self, now_ms: u64) -> Vec<usize> {
        let fired = self.scheduler.due(now_ms);
        if fired.is_empty() {
            return fired;
        }
        for index in &fired {
            if let Some(slot) = self.revealed_at.get_mut(*index) {
                *slot = Some(now_ms);
            }
        }
        self.pending.prune(&self.scheduler);
        fired
    }

    /// Current style of item `index`.
    pub fn item_style(&self, index: usize, now_ms: u64) -> StyleProps {
        match self.revealed_at.get(index).copied().flatten() {
            None => self.variant.hidden,
            Some(at) => {
                let tween = Tween::new(
                    at,
                    self.variant.transition.duration_ms(),
                    self.variant.transition.easing,
                );
                self.variant.style_at(tween.progress(now_ms))
            }
        }
    }

    /// Cancel every pending reveal. Called on unmount.
    pub fn dispose(&mut self) -> usize {
        self.pending.dispose(&mut self.scheduler)
    }
}

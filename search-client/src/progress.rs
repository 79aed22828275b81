//! Pulsing busy indicator for regions with requests in flight.
//!
//! Starts and stops are reference counted per target: the pulse begins with
//! the first `start` and ends, restoring full opacity, when the last holder
//! calls `stop`.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

const LOW_OPACITY: f32 = 0.2;
const FULL_OPACITY: f32 = 1.0;
const FRAMES_PER_FADE: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgressTarget {
    /// The results and document area.
    Content,
    /// The search form and its facet controls.
    QueryBox,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Appearance {
    pub loading: bool,
    pub opacity: f32,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            loading: false,
            opacity: FULL_OPACITY,
        }
    }
}

struct Pulse {
    holders: usize,
    appearance: watch::Sender<Appearance>,
    task: Option<JoinHandle<()>>,
}

impl Pulse {
    fn new() -> Self {
        let (appearance, _) = watch::channel(Appearance::default());
        Self {
            holders: 0,
            appearance,
            task: None,
        }
    }

    fn halt(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.appearance.send_replace(Appearance::default());
    }
}

pub struct ProgressIndicator {
    period: Duration,
    targets: HashMap<ProgressTarget, Pulse>,
}

impl ProgressIndicator {
    /// `period` is the duration of one fade; a full pulse takes twice that.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            targets: HashMap::new(),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, target: ProgressTarget) {
        let period = self.period;
        let pulse = self.targets.entry(target).or_insert_with(Pulse::new);
        pulse.holders += 1;
        if pulse.holders > 1 {
            return;
        }
        debug!(?target, "progress started");
        pulse.appearance.send_modify(|appearance| appearance.loading = true);
        let sender = pulse.appearance.clone();
        pulse.task = Some(tokio::spawn(run_pulse(sender, period)));
    }

    pub fn stop(&mut self, target: ProgressTarget) {
        let Some(pulse) = self.targets.get_mut(&target) else {
            return;
        };
        if pulse.holders == 0 {
            return;
        }
        pulse.holders -= 1;
        if pulse.holders == 0 {
            debug!(?target, "progress stopped");
            pulse.halt();
        }
    }

    pub fn appearance(&self, target: ProgressTarget) -> Appearance {
        self.targets
            .get(&target)
            .map(|pulse| *pulse.appearance.borrow())
            .unwrap_or_default()
    }

    pub fn is_active(&self, target: ProgressTarget) -> bool {
        self.appearance(target).loading
    }

    pub fn subscribe(&mut self, target: ProgressTarget) -> watch::Receiver<Appearance> {
        self.targets
            .entry(target)
            .or_insert_with(Pulse::new)
            .appearance
            .subscribe()
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        for pulse in self.targets.values_mut() {
            if let Some(task) = pulse.task.take() {
                task.abort();
            }
        }
    }
}

async fn run_pulse(appearance: watch::Sender<Appearance>, period: Duration) {
    let frame = period / FRAMES_PER_FADE;
    loop {
        fade(&appearance, FULL_OPACITY, LOW_OPACITY, frame).await;
        fade(&appearance, LOW_OPACITY, FULL_OPACITY, frame).await;
    }
}

async fn fade(appearance: &watch::Sender<Appearance>, from: f32, to: f32, frame: Duration) {
    for step in 1..=FRAMES_PER_FADE {
        tokio::time::sleep(frame).await;
        let opacity = from + (to - from) * step as f32 / FRAMES_PER_FADE as f32;
        appearance.send_modify(|current| current.opacity = opacity);
    }
}

use super::state::{RetryPolicy, SyncLifecycle, SyncState};
use crate::viewer::{PageLayout, centered_offset};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Enqueue {
        page: u32,
    },
    ViewerReady,
    ViewerReloaded,
    PageRendered {
        page: u32,
    },
    RetryElapsed {
        generation: u64,
    },
    LayoutResolved {
        page: u32,
        layout: PageLayout,
        container_height: f64,
    },
    LayoutUnavailable {
        page: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    SetPage {
        page: u32,
    },
    /// Ask the viewer for the page layout; the answer comes back as
    /// `LayoutResolved` or `LayoutUnavailable`.
    ResolveLayout {
        page: u32,
    },
    ScrollTo {
        page: u32,
        offset: f64,
    },
    ScheduleRetry {
        page: u32,
        attempt: u32,
        delay: Duration,
        generation: u64,
    },
    CancelRetry,
}

pub fn transition(
    state: &mut SyncState,
    policy: &RetryPolicy,
    event: SyncEvent,
) -> Vec<SyncAction> {
    match event {
        SyncEvent::Enqueue { page } => on_enqueue(state, page),
        SyncEvent::ViewerReady => on_viewer_ready(state),
        SyncEvent::ViewerReloaded => on_viewer_reloaded(state),
        SyncEvent::PageRendered { page } => on_page_rendered(state, page),
        SyncEvent::RetryElapsed { generation } => on_retry_elapsed(state, generation),
        SyncEvent::LayoutResolved {
            page,
            layout,
            container_height,
        } => on_layout_resolved(state, page, layout, container_height),
        SyncEvent::LayoutUnavailable { page } => on_layout_unavailable(state, policy, page),
    }
}

fn on_enqueue(state: &mut SyncState, page: u32) -> Vec<SyncAction> {
    if !state.queue.push(page) {
        debug!(page, "Page already queued at tail; collapsing");
        return Vec::new();
    }
    debug!(page, queued = state.queue.len(), "Queued page navigation");
    if state.viewer_ready && state.is_idle() {
        return begin_head(state);
    }
    Vec::new()
}

fn on_viewer_ready(state: &mut SyncState) -> Vec<SyncAction> {
    let was_ready = state.viewer_ready;
    state.viewer_ready = true;
    if !was_ready {
        info!(queued = state.queue.len(), "Viewer ready; draining navigation queue");
    }
    if state.is_idle() {
        return begin_head(state);
    }
    Vec::new()
}

fn on_viewer_reloaded(state: &mut SyncState) -> Vec<SyncAction> {
    info!(
        dropped = state.queue.len(),
        "Viewer reloaded; resetting navigation state"
    );
    state.viewer_ready = false;
    state.queue.clear();
    state.lifecycle = SyncLifecycle::Idle;
    state.bump_generation();
    vec![SyncAction::CancelRetry]
}

fn on_page_rendered(state: &mut SyncState, rendered: u32) -> Vec<SyncAction> {
    let SyncLifecycle::RetryPending { page, failures, .. } = state.lifecycle else {
        return Vec::new();
    };
    if page != rendered {
        return Vec::new();
    }
    debug!(page, failures, "Pending page rendered; retrying immediately");
    state.bump_generation();
    state.lifecycle = SyncLifecycle::Attempting { page, failures };
    vec![SyncAction::CancelRetry, SyncAction::ResolveLayout { page }]
}

fn on_retry_elapsed(state: &mut SyncState, generation: u64) -> Vec<SyncAction> {
    match state.lifecycle {
        SyncLifecycle::RetryPending {
            page,
            failures,
            generation: pending,
        } if pending == generation => {
            debug!(page, attempt = failures + 1, "Retry delay elapsed");
            state.lifecycle = SyncLifecycle::Attempting { page, failures };
            vec![SyncAction::ResolveLayout { page }]
        }
        _ => {
            debug!(generation, "Ignoring stale retry timer");
            Vec::new()
        }
    }
}

fn on_layout_resolved(
    state: &mut SyncState,
    page: u32,
    layout: PageLayout,
    container_height: f64,
) -> Vec<SyncAction> {
    let SyncLifecycle::Attempting { page: target, failures } = state.lifecycle else {
        return Vec::new();
    };
    if target != page {
        return Vec::new();
    }

    let offset = centered_offset(layout, container_height);
    info!(page, offset, attempts = failures + 1, "Navigated to page");
    state.queue.pop_head();
    state.lifecycle = SyncLifecycle::Idle;

    let mut actions = vec![SyncAction::ScrollTo { page, offset }];
    actions.extend(begin_head(state));
    actions
}

fn on_layout_unavailable(
    state: &mut SyncState,
    policy: &RetryPolicy,
    page: u32,
) -> Vec<SyncAction> {
    let SyncLifecycle::Attempting { page: target, failures } = state.lifecycle else {
        return Vec::new();
    };
    if target != page {
        return Vec::new();
    }

    let failures = failures + 1;
    if failures < policy.max_attempts() {
        let generation = state.bump_generation();
        state.lifecycle = SyncLifecycle::RetryPending {
            page,
            failures,
            generation,
        };
        debug!(
            page,
            failures,
            delay_ms = policy.retry_delay.as_millis() as u64,
            "Page not renderable yet; scheduling retry"
        );
        return vec![SyncAction::ScheduleRetry {
            page,
            attempt: failures + 1,
            delay: policy.retry_delay,
            generation,
        }];
    }

    warn!(
        page,
        attempts = failures,
        "Page never became renderable; abandoning navigation"
    );
    state.queue.pop_head();
    state.lifecycle = SyncLifecycle::Idle;
    begin_head(state)
}

/// Start resolving the queue head, if there is one and the viewer is ready.
fn begin_head(state: &mut SyncState) -> Vec<SyncAction> {
    if !state.viewer_ready {
        return Vec::new();
    }
    let Some(page) = state.queue.head() else {
        return Vec::new();
    };
    state.lifecycle = SyncLifecycle::Attempting { page, failures: 0 };
    vec![SyncAction::SetPage { page }, SyncAction::ResolveLayout { page }]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(250))
    }

    fn layout() -> PageLayout {
        PageLayout {
            top: 1000.0,
            height: 500.0,
        }
    }

    fn ready_state() -> SyncState {
        let mut state = SyncState::new();
        transition(&mut state, &policy(), SyncEvent::ViewerReady);
        state
    }

    #[test]
    fn enqueue_before_ready_only_accumulates() {
        let mut state = SyncState::new();
        for page in [2, 3, 4] {
            let actions = transition(&mut state, &policy(), SyncEvent::Enqueue { page });
            assert!(actions.is_empty());
        }
        assert!(state.is_idle());
        assert_eq!(state.queue().len(), 3);

        let actions = transition(&mut state, &policy(), SyncEvent::ViewerReady);
        assert_eq!(
            actions,
            vec![
                SyncAction::SetPage { page: 2 },
                SyncAction::ResolveLayout { page: 2 }
            ]
        );
        assert_eq!(state.in_flight(), Some(2));
    }

    #[test]
    fn enqueue_while_attempting_appends_behind_head() {
        let mut state = ready_state();
        transition(&mut state, &policy(), SyncEvent::Enqueue { page: 5 });
        let actions = transition(&mut state, &policy(), SyncEvent::Enqueue { page: 6 });
        assert!(actions.is_empty());
        assert_eq!(state.queue().head(), Some(5));
        assert_eq!(state.in_flight(), Some(5));
    }

    #[test]
    fn resolved_layout_scrolls_and_advances() {
        let mut state = ready_state();
        transition(&mut state, &policy(), SyncEvent::Enqueue { page: 5 });
        transition(&mut state, &policy(), SyncEvent::Enqueue { page: 6 });

        let actions = transition(
            &mut state,
            &policy(),
            SyncEvent::LayoutResolved {
                page: 5,
                layout: layout(),
                container_height: 800.0,
            },
        );
        assert_eq!(
            actions,
            vec![
                SyncAction::ScrollTo {
                    page: 5,
                    offset: 850.0
                },
                SyncAction::SetPage { page: 6 },
                SyncAction::ResolveLayout { page: 6 },
            ]
        );
        assert_eq!(state.queue().len(), 1);
    }

    #[test]
    fn failures_schedule_retries_then_abandon() {
        let mut state = ready_state();
        transition(&mut state, &policy(), SyncEvent::Enqueue { page: 5 });

        let first = transition(&mut state, &policy(), SyncEvent::LayoutUnavailable { page: 5 });
        let SyncAction::ScheduleRetry {
            attempt,
            generation,
            ..
        } = first[0].clone()
        else {
            panic!("expected a scheduled retry, got {first:?}");
        };
        assert_eq!(attempt, 2);
        assert_eq!(state.queue().head(), Some(5));

        let retried = transition(&mut state, &policy(), SyncEvent::RetryElapsed { generation });
        assert_eq!(retried, vec![SyncAction::ResolveLayout { page: 5 }]);
        let second = transition(&mut state, &policy(), SyncEvent::LayoutUnavailable { page: 5 });
        let SyncAction::ScheduleRetry { generation, .. } = second[0].clone() else {
            panic!("expected a scheduled retry, got {second:?}");
        };
        transition(&mut state, &policy(), SyncEvent::RetryElapsed { generation });

        let dropped = transition(&mut state, &policy(), SyncEvent::LayoutUnavailable { page: 5 });
        assert!(dropped.is_empty());
        assert!(state.is_idle());
        assert!(state.queue().is_empty());
    }

    #[test]
    fn stale_timer_is_ignored() {
        let mut state = ready_state();
        transition(&mut state, &policy(), SyncEvent::Enqueue { page: 5 });
        transition(&mut state, &policy(), SyncEvent::LayoutUnavailable { page: 5 });
        let stale = state.generation.wrapping_sub(1);
        let actions = transition(
            &mut state,
            &policy(),
            SyncEvent::RetryElapsed { generation: stale },
        );
        assert!(actions.is_empty());
        assert!(matches!(state.lifecycle(), SyncLifecycle::RetryPending { .. }));
    }

    #[test]
    fn render_notification_short_circuits_retry_delay() {
        let mut state = ready_state();
        transition(&mut state, &policy(), SyncEvent::Enqueue { page: 5 });
        transition(&mut state, &policy(), SyncEvent::LayoutUnavailable { page: 5 });
        let pending_generation = state.generation;

        assert!(transition(&mut state, &policy(), SyncEvent::PageRendered { page: 4 }).is_empty());
        let actions = transition(&mut state, &policy(), SyncEvent::PageRendered { page: 5 });
        assert_eq!(
            actions,
            vec![SyncAction::CancelRetry, SyncAction::ResolveLayout { page: 5 }]
        );
        assert_eq!(
            state.lifecycle(),
            SyncLifecycle::Attempting {
                page: 5,
                failures: 1
            }
        );
        assert!(
            transition(
                &mut state,
                &policy(),
                SyncEvent::RetryElapsed {
                    generation: pending_generation
                }
            )
            .is_empty()
        );
    }

    #[test]
    fn reload_resets_everything() {
        let mut state = ready_state();
        transition(&mut state, &policy(), SyncEvent::Enqueue { page: 5 });
        transition(&mut state, &policy(), SyncEvent::Enqueue { page: 6 });
        transition(&mut state, &policy(), SyncEvent::LayoutUnavailable { page: 5 });

        let actions = transition(&mut state, &policy(), SyncEvent::ViewerReloaded);
        assert_eq!(actions, vec![SyncAction::CancelRetry]);
        assert!(state.is_idle());
        assert!(state.queue().is_empty());
        assert!(!state.viewer_ready());

        let actions = transition(&mut state, &policy(), SyncEvent::Enqueue { page: 7 });
        assert!(actions.is_empty());
    }

    #[test]
    fn late_layout_answers_for_other_pages_are_ignored() {
        let mut state = ready_state();
        transition(&mut state, &policy(), SyncEvent::Enqueue { page: 5 });
        let actions = transition(
            &mut state,
            &policy(),
            SyncEvent::LayoutResolved {
                page: 9,
                layout: layout(),
                container_height: 800.0,
            },
        );
        assert!(actions.is_empty());
        assert_eq!(state.in_flight(), Some(5));
        let actions = transition(&mut state, &policy(), SyncEvent::LayoutUnavailable { page: 9 });
        assert!(actions.is_empty());
    }
}

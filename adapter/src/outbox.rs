//! Calendar invites are queued after the write commits and delivered by a
//! background worker, so a mail outage never fails or slows down a request.

use kernel::gateway::calendar::{CalendarOutbox, CalendarTransport};
use kernel::model::calendar::{CalendarInvite, CalendarMethod};
use kernel::repository::meeting::MeetingRepository;
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub struct ChannelOutbox {
    tx: mpsc::UnboundedSender<CalendarInvite>,
}

impl ChannelOutbox {
    /// The receiver has to be handed to [`run_outbox_worker`].
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CalendarInvite>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CalendarOutbox for ChannelOutbox {
    fn enqueue(&self, invite: CalendarInvite) {
        debug!(
            meeting_id = %invite.meeting_id,
            sequence = invite.sequence,
            method = %invite.method,
            "calendar invite queued"
        );
        if self.tx.send(invite).is_err() {
            warn!("calendar outbox worker has stopped; invite dropped");
        }
    }
}

/// Drains the queue until every sender is dropped.
pub async fn run_outbox_worker(
    mut rx: mpsc::UnboundedReceiver<CalendarInvite>,
    transport: Arc<dyn CalendarTransport>,
    meetings: Arc<dyn MeetingRepository>,
    retry_count: usize,
) {
    info!("calendar outbox worker started");

    while let Some(invite) = rx.recv().await {
        if deliver(transport.as_ref(), &invite, retry_count).await
            && invite.method == CalendarMethod::Request
        {
            if let Err(e) = meetings
                .mark_invite_sent(invite.meeting_id, invite.sequence)
                .await
            {
                warn!(meeting_id = %invite.meeting_id, error = %e, "could not record invite delivery");
            }
        }
    }

    info!("calendar outbox worker stopped");
}

async fn deliver(transport: &dyn CalendarTransport, invite: &CalendarInvite, retry_count: usize) -> bool {
    for attempt in 0..=retry_count {
        match transport.send_invite(invite).await {
            Ok(()) => {
                debug!(
                    meeting_id = %invite.meeting_id,
                    sequence = invite.sequence,
                    attempts = attempt + 1,
                    "calendar invite delivered"
                );
                return true;
            }
            Err(e) => {
                warn!(
                    meeting_id = %invite.meeting_id,
                    attempt = attempt + 1,
                    error = %e,
                    "calendar invite delivery failed"
                );
            }
        }

        // 指数バックオフ
        if attempt < retry_count {
            let delay = Duration::from_millis(100 * 2u64.pow(attempt as u32));
            tokio::time::sleep(delay).await;
        }
    }

    error!(
        meeting_id = %invite.meeting_id,
        sequence = invite.sequence,
        method = %invite.method,
        "calendar invite dropped after {} attempts",
        retry_count + 1
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use kernel::model::{
        event::event::CreateEvent,
        id::UserId,
        meeting::event::CreateMeeting,
        settings::SystemSettings,
        time::TimeRange,
    };
    use kernel::repository::event::EventRepository;
    use shared::error::{AppError, AppResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyTransport {
        failures_left: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CalendarTransport for FlakyTransport {
        async fn send_invite(&self, _invite: &CalendarInvite) -> AppResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(AppError::ExternalServiceError("smtp down".into()));
            }
            Ok(())
        }
    }

    async fn stored_meeting(store: &MemoryStore) -> kernel::model::meeting::Meeting {
        let event = CreateEvent {
            name: "Outbox".into(),
            ..Default::default()
        }
        .into_event(&SystemSettings::default(), UserId::new())
        .unwrap();
        EventRepository::create(store, event.clone()).await.unwrap();
        let draft = CreateMeeting {
            date: Some("2025-12-25".into()),
            start_time: Some("10:00".into()),
            end_time: Some("11:00".into()),
            ..CreateMeeting::new(event.id, "Sync", UserId::new())
        }
        .into_draft()
        .unwrap();
        MeetingRepository::create(store, draft).await.unwrap()
    }

    fn invite_for(meeting: &kernel::model::meeting::Meeting, method: CalendarMethod) -> CalendarInvite {
        CalendarInvite {
            method,
            meeting_id: meeting.id,
            sequence: meeting.sequence,
            title: meeting.title.clone(),
            description: None,
            location: None,
            range: TimeRange::new(
                Utc.with_ymd_and_hms(2025, 12, 25, 10, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 12, 25, 11, 0, 0).unwrap(),
            )
            .unwrap(),
            organizer: "planner@example.com".into(),
            recipients: vec![],
        }
    }

    #[tokio::test]
    async fn retries_then_records_delivery() {
        let store = Arc::new(MemoryStore::new());
        let meeting = stored_meeting(&store).await;
        let transport = Arc::new(FlakyTransport {
            failures_left: AtomicUsize::new(2),
            calls: AtomicUsize::new(0),
        });

        let (outbox, rx) = ChannelOutbox::new();
        let worker = tokio::spawn(run_outbox_worker(rx, transport.clone(), store.clone(), 3));
        outbox.enqueue(invite_for(&meeting, CalendarMethod::Request));
        drop(outbox);
        worker.await.unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        let stored = MeetingRepository::find_by_id(store.as_ref(), meeting.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.calendar_invite_sent);
    }

    #[tokio::test]
    async fn gives_up_after_retry_budget() {
        let store = Arc::new(MemoryStore::new());
        let meeting = stored_meeting(&store).await;
        let transport = Arc::new(FlakyTransport {
            failures_left: AtomicUsize::new(10),
            calls: AtomicUsize::new(0),
        });

        let (outbox, rx) = ChannelOutbox::new();
        let worker = tokio::spawn(run_outbox_worker(rx, transport.clone(), store.clone(), 1));
        outbox.enqueue(invite_for(&meeting, CalendarMethod::Request));
        drop(outbox);
        worker.await.unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        let stored = MeetingRepository::find_by_id(store.as_ref(), meeting.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.calendar_invite_sent);
    }
}

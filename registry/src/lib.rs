use std::sync::Arc;

use adapter::database::ConnectionPool;
use adapter::enrichment::ChatCompletionEnricher;
use adapter::mail::{GmailTransport, LogTransport};
use adapter::memory::MemoryStore;
use adapter::outbox::{run_outbox_worker, ChannelOutbox};
use adapter::repository::{
    attendee::AttendeeRepositoryImpl, event::EventRepositoryImpl,
    health::HealthCheckRepositoryImpl, meeting::MeetingRepositoryImpl, room::RoomRepositoryImpl,
    settings::SettingsRepositoryImpl, transfer::TransferRepositoryImpl,
};
use adapter::storage::LocalImageStorage;
use kernel::gateway::{
    calendar::{CalendarOutbox, CalendarTransport},
    enrichment::ProfileEnricher,
    image::ImageStorage,
};
use kernel::repository::{
    attendee::AttendeeRepository, event::EventRepository, health::HealthCheckRepository,
    meeting::MeetingRepository, room::RoomRepository, settings::SettingsRepository,
    transfer::TransferRepository,
};
use shared::config::AppConfig;

const DEFAULT_ORGANIZER: &str = "planner@localhost";

#[derive(Clone)]
pub struct AppRegistry {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    event_repository: Arc<dyn EventRepository>,
    room_repository: Arc<dyn RoomRepository>,
    attendee_repository: Arc<dyn AttendeeRepository>,
    meeting_repository: Arc<dyn MeetingRepository>,
    settings_repository: Arc<dyn SettingsRepository>,
    transfer_repository: Arc<dyn TransferRepository>,
    calendar_outbox: Arc<dyn CalendarOutbox>,
    profile_enricher: Arc<dyn ProfileEnricher>,
    image_storage: Arc<dyn ImageStorage>,
    organizer: String,
}

struct Repositories {
    health: Arc<dyn HealthCheckRepository>,
    event: Arc<dyn EventRepository>,
    room: Arc<dyn RoomRepository>,
    attendee: Arc<dyn AttendeeRepository>,
    meeting: Arc<dyn MeetingRepository>,
    settings: Arc<dyn SettingsRepository>,
    transfer: Arc<dyn TransferRepository>,
}

impl AppRegistry {
    /// PostgreSQL-backed registry. Must be called inside a tokio runtime:
    /// the calendar outbox worker is spawned here.
    pub fn new(pool: ConnectionPool, app_config: AppConfig) -> Self {
        let repositories = Repositories {
            health: Arc::new(HealthCheckRepositoryImpl::new(pool.clone())),
            event: Arc::new(EventRepositoryImpl::new(pool.clone())),
            room: Arc::new(RoomRepositoryImpl::new(pool.clone())),
            attendee: Arc::new(AttendeeRepositoryImpl::new(pool.clone())),
            meeting: Arc::new(MeetingRepositoryImpl::new(pool.clone())),
            settings: Arc::new(SettingsRepositoryImpl::new(pool.clone())),
            transfer: Arc::new(TransferRepositoryImpl::new(pool)),
        };
        Self::assemble(repositories, &app_config)
    }

    /// Registry over the process-local store.
    pub fn in_memory(app_config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let repositories = Repositories {
            health: store.clone(),
            event: store.clone(),
            room: store.clone(),
            attendee: store.clone(),
            meeting: store.clone(),
            settings: store.clone(),
            transfer: store,
        };
        Self::assemble(repositories, &app_config)
    }

    fn assemble(repositories: Repositories, app_config: &AppConfig) -> Self {
        let transport: Arc<dyn CalendarTransport> =
            match (&app_config.mail.sender, &app_config.mail.service_account_key) {
                (Some(sender), Some(key)) => {
                    Arc::new(GmailTransport::new(sender.clone(), key.clone()))
                }
                _ => Arc::new(LogTransport),
            };

        let (outbox, rx) = ChannelOutbox::new();
        tokio::spawn(run_outbox_worker(
            rx,
            transport,
            repositories.meeting.clone(),
            app_config.outbox.retry_count,
        ));

        Self {
            health_check_repository: repositories.health,
            event_repository: repositories.event,
            room_repository: repositories.room,
            attendee_repository: repositories.attendee,
            meeting_repository: repositories.meeting,
            settings_repository: repositories.settings,
            transfer_repository: repositories.transfer,
            calendar_outbox: Arc::new(outbox),
            profile_enricher: Arc::new(ChatCompletionEnricher::new(
                app_config.llm.api_base.clone(),
                app_config.llm.timeout_secs,
            )),
            image_storage: Arc::new(LocalImageStorage::new(
                app_config.image.directory.clone(),
                app_config.image.public_base_url.clone(),
            )),
            organizer: app_config
                .mail
                .sender
                .clone()
                .unwrap_or_else(|| DEFAULT_ORGANIZER.into()),
        }
    }

    pub fn with_calendar_outbox(mut self, outbox: Arc<dyn CalendarOutbox>) -> Self {
        self.calendar_outbox = outbox;
        self
    }

    pub fn with_profile_enricher(mut self, enricher: Arc<dyn ProfileEnricher>) -> Self {
        self.profile_enricher = enricher;
        self
    }

    pub fn with_image_storage(mut self, storage: Arc<dyn ImageStorage>) -> Self {
        self.image_storage = storage;
        self
    }

    pub fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    pub fn event_repository(&self) -> Arc<dyn EventRepository> {
        self.event_repository.clone()
    }

    pub fn room_repository(&self) -> Arc<dyn RoomRepository> {
        self.room_repository.clone()
    }

    pub fn attendee_repository(&self) -> Arc<dyn AttendeeRepository> {
        self.attendee_repository.clone()
    }

    pub fn meeting_repository(&self) -> Arc<dyn MeetingRepository> {
        self.meeting_repository.clone()
    }

    pub fn settings_repository(&self) -> Arc<dyn SettingsRepository> {
        self.settings_repository.clone()
    }

    pub fn transfer_repository(&self) -> Arc<dyn TransferRepository> {
        self.transfer_repository.clone()
    }

    pub fn calendar_outbox(&self) -> Arc<dyn CalendarOutbox> {
        self.calendar_outbox.clone()
    }

    pub fn profile_enricher(&self) -> Arc<dyn ProfileEnricher> {
        self.profile_enricher.clone()
    }

    pub fn image_storage(&self) -> Arc<dyn ImageStorage> {
        self.image_storage.clone()
    }

    /// Address used as the ORGANIZER of calendar invites.
    pub fn organizer(&self) -> &str {
        &self.organizer
    }
}

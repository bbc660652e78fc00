use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use actix_web::web::Bytes;
use chrono::NaiveDateTime;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::models::VideoRecord;
use crate::error::PlaybackError;
use crate::media::{is_sample_name, MediaType, UploadPolicy};
use crate::services::demo::{DemoFrame, DemoKind, DemoLoop, DemoStatus};
use crate::store::VideoStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderReason {
    Flagged,
    SampleName,
    TooSmall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnusableReason {
    EmptyPayload,
    UnsupportedType,
    Truncated,
    Undecodable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum Classification {
    Placeholder(PlaceholderReason),
    Unusable(UnusableReason),
    RealMedia(MediaType),
}

/// Decides whether a record carries genuine, playable footage.
pub fn classify(record: &VideoRecord, policy: &UploadPolicy) -> Classification {
    if record.is_sample {
        return Classification::Placeholder(PlaceholderReason::Flagged);
    }
    if is_sample_name(&record.file_name) {
        return Classification::Placeholder(PlaceholderReason::SampleName);
    }
    if record.file_size < policy.placeholder_threshold {
        return Classification::Placeholder(PlaceholderReason::TooSmall);
    }
    if record.file_data.is_empty() {
        return Classification::Unusable(UnusableReason::EmptyPayload);
    }
    if !policy.supports(&record.file_type) {
        return Classification::Unusable(UnusableReason::UnsupportedType);
    }
    if (record.file_data.len() as u64) < policy.placeholder_threshold {
        return Classification::Unusable(UnusableReason::Truncated);
    }
    match MediaType::sniff(&record.file_data) {
        Some(media_type) => Classification::RealMedia(media_type),
        None => Classification::Unusable(UnusableReason::Undecodable),
    }
}

/// A transient, exclusively owned view over a record's payload, valid for
/// one playback attempt.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    pub id: Uuid,
    pub video_id: String,
    pub content_type: String,
    pub data: Bytes,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct HandleInfo {
    pub id: Uuid,
    pub video_id: String,
    pub content_type: String,
    pub size: usize,
}

impl From<&PlaybackHandle> for HandleInfo {
    fn from(handle: &PlaybackHandle) -> Self {
        HandleInfo {
            id: handle.id,
            video_id: handle.video_id.clone(),
            content_type: handle.content_type.clone(),
            size: handle.data.len(),
        }
    }
}

#[derive(Debug)]
enum PlaybackState {
    Resolving,
    NotFound,
    AnimatingDemo(DemoLoop),
    PlayingReal { handle: Uuid },
    Errored { reason: String },
    Ended,
}

impl PlaybackState {
    fn name(&self) -> &'static str {
        match self {
            PlaybackState::Resolving => "resolving",
            PlaybackState::NotFound => "not_found",
            PlaybackState::AnimatingDemo(_) => "animating_demo",
            PlaybackState::PlayingReal { .. } => "playing_real",
            PlaybackState::Errored { .. } => "errored",
            PlaybackState::Ended => "ended",
        }
    }
}

/// Serializable view of one video's playback session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub video_id: String,
    pub state: &'static str,
    pub handle: Option<Uuid>,
    pub demo: Option<DemoStatus>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    NotFound,
    Demo {
        classification: Classification,
        demo: DemoStatus,
    },
    Real {
        handle: HandleInfo,
    },
}

/// How many sessions the resolver keeps, and how long an untouched one lives.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 1024,
            idle_timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Debug)]
struct Session {
    state: PlaybackState,
    touched: Instant,
}

#[derive(Default)]
struct Sessions {
    states: HashMap<String, Session>,
    handles: HashMap<Uuid, PlaybackHandle>,
}

impl Sessions {
    fn release(&mut self, handle: Uuid) {
        if let Some(released) = self.handles.remove(&handle) {
            log::info!(
                "Released playback handle {} for video {}",
                handle,
                released.video_id
            );
        }
    }

    /// Releases the handle held by a real playback session, if any.
    fn release_for(&mut self, video_id: &str) {
        if let Some(Session {
            state: PlaybackState::PlayingReal { handle },
            ..
        }) = self.states.get(video_id)
        {
            let handle = *handle;
            self.release(handle);
        }
    }

    /// Installs a state, evicting the least recently touched session when a
    /// new id would exceed `max_sessions`.
    fn set(&mut self, video_id: &str, state: PlaybackState, max_sessions: usize) {
        if !self.states.contains_key(video_id) {
            while self.states.len() >= max_sessions.max(1) && self.evict_oldest() {}
        }
        self.states.insert(
            video_id.to_string(),
            Session {
                state,
                touched: Instant::now(),
            },
        );
    }

    fn remove(&mut self, video_id: &str) -> bool {
        self.release_for(video_id);
        self.states.remove(video_id).is_some()
    }

    fn evict_oldest(&mut self) -> bool {
        let oldest = self
            .states
            .iter()
            .min_by_key(|(_, session)| session.touched)
            .map(|(id, _)| id.clone());
        match oldest {
            Some(video_id) => {
                log::debug!("Evicting playback session for video {}", video_id);
                self.remove(&video_id)
            }
            None => false,
        }
    }

    fn evict_idle(&mut self, idle_timeout: Duration) -> usize {
        let stale: Vec<String> = self
            .states
            .iter()
            .filter(|(_, session)| session.touched.elapsed() >= idle_timeout)
            .map(|(id, _)| id.clone())
            .collect();
        for video_id in &stale {
            self.remove(video_id);
        }
        stale.len()
    }

    fn state(&mut self, video_id: &str) -> Result<&mut PlaybackState, PlaybackError> {
        let session = self
            .states
            .get_mut(video_id)
            .ok_or_else(|| PlaybackError::NoSession(video_id.to_string()))?;
        session.touched = Instant::now();
        Ok(&mut session.state)
    }

    fn demo(&mut self, video_id: &str, action: &'static str) -> Result<&mut DemoLoop, PlaybackError> {
        match self.state(video_id)? {
            PlaybackState::AnimatingDemo(demo) => Ok(demo),
            other => Err(PlaybackError::InvalidTransition {
                video_id: video_id.to_string(),
                state: other.name(),
                action,
            }),
        }
    }
}

/// Resolves video ids to either real playback or a procedural demo, and
/// tracks the playback session of each id.
pub struct PlaybackResolver {
    store: Arc<dyn VideoStore>,
    policy: UploadPolicy,
    loop_period: u32,
    limits: SessionLimits,
    sessions: Mutex<Sessions>,
}

impl PlaybackResolver {
    pub fn new(store: Arc<dyn VideoStore>, policy: UploadPolicy, loop_period: u32) -> Self {
        Self {
            store,
            policy,
            loop_period,
            limits: SessionLimits::default(),
            sessions: Mutex::new(Sessions::default()),
        }
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub async fn resolve(&self, video_id: &str) -> Result<Resolution, PlaybackError> {
        let max_sessions = self.limits.max_sessions;
        {
            let mut sessions = self.sessions.lock().await;
            sessions.release_for(video_id);
            sessions.set(video_id, PlaybackState::Resolving, max_sessions);
        }

        let lookup = self.store.get(video_id).await;
        let mut sessions = self.sessions.lock().await;
        // A concurrent resolve of the same id may have installed a handle meanwhile.
        sessions.release_for(video_id);

        let record = match lookup {
            Ok(Some(record)) => record,
            Ok(None) => {
                log::info!("Video {} not found", video_id);
                sessions.set(video_id, PlaybackState::NotFound, max_sessions);
                return Ok(Resolution::NotFound);
            }
            Err(source) => {
                log::error!("Failed to look up video {}: {}", video_id, source);
                let demo = self.demo_for(video_id, None, None);
                sessions.set(video_id, PlaybackState::AnimatingDemo(demo), max_sessions);
                return Err(PlaybackError::StoreUnavailable {
                    video_id: video_id.to_string(),
                    source,
                });
            }
        };

        let classification = classify(&record, &self.policy);
        match classification {
            Classification::RealMedia(_) => {
                let handle = PlaybackHandle {
                    id: Uuid::new_v4(),
                    video_id: record.video_id.clone(),
                    content_type: record.file_type.clone(),
                    data: Bytes::from(record.file_data),
                    created_at: chrono::Utc::now().naive_utc(),
                };
                let info = HandleInfo::from(&handle);
                log::info!(
                    "Created playback handle {} for video {} ({} bytes)",
                    handle.id,
                    video_id,
                    info.size
                );
                sessions.set(
                    video_id,
                    PlaybackState::PlayingReal { handle: handle.id },
                    max_sessions,
                );
                sessions.handles.insert(handle.id, handle);
                Ok(Resolution::Real { handle: info })
            }
            Classification::Placeholder(_) | Classification::Unusable(_) => {
                if let Classification::Unusable(reason) = classification {
                    log::warn!("Video {} has unusable media: {:?}", video_id, reason);
                }
                let demo = self.demo_for(video_id, Some(&record.title), record.category);
                let status = demo.status();
                sessions.set(video_id, PlaybackState::AnimatingDemo(demo), max_sessions);
                Ok(Resolution::Demo {
                    classification,
                    demo: status,
                })
            }
        }
    }

    /// Puts a video straight into demo mode, e.g. after a failed lookup.
    pub async fn start_demo(&self, video_id: &str, category: Option<String>) -> DemoStatus {
        let demo = self.demo_for(video_id, None, category);
        let status = demo.status();

        let mut sessions = self.sessions.lock().await;
        sessions.release_for(video_id);
        sessions.set(
            video_id,
            PlaybackState::AnimatingDemo(demo),
            self.limits.max_sessions,
        );
        status
    }

    /// The presentation layer could not decode the real media.
    pub async fn report_error(&self, video_id: &str, reason: impl Into<String>) -> Result<(), PlaybackError> {
        let reason = reason.into();
        let mut sessions = self.sessions.lock().await;
        let handle = self.playing_handle(&mut sessions, video_id, "report an error for")?;

        log::error!("Playback of video {} failed: {}", video_id, reason);
        sessions.release(handle);
        sessions.set(
            video_id,
            PlaybackState::Errored { reason },
            self.limits.max_sessions,
        );
        Ok(())
    }

    /// Normal completion or explicit stop of real playback.
    pub async fn finish(&self, video_id: &str) -> Result<(), PlaybackError> {
        let mut sessions = self.sessions.lock().await;
        let handle = self.playing_handle(&mut sessions, video_id, "finish")?;

        sessions.release(handle);
        sessions.set(video_id, PlaybackState::Ended, self.limits.max_sessions);
        Ok(())
    }

    /// Manual retry from the errored state.
    pub async fn retry(&self, video_id: &str) -> Result<Resolution, PlaybackError> {
        {
            let mut sessions = self.sessions.lock().await;
            match sessions.state(video_id)? {
                PlaybackState::Errored { .. } => {}
                other => {
                    return Err(PlaybackError::InvalidTransition {
                        video_id: video_id.to_string(),
                        state: other.name(),
                        action: "retry",
                    })
                }
            }
        }
        self.resolve(video_id).await
    }

    pub async fn pause(&self, video_id: &str) -> Result<DemoStatus, PlaybackError> {
        let mut sessions = self.sessions.lock().await;
        let demo = sessions.demo(video_id, "pause")?;
        demo.pause();
        Ok(demo.status())
    }

    pub async fn resume(&self, video_id: &str) -> Result<DemoStatus, PlaybackError> {
        let mut sessions = self.sessions.lock().await;
        let demo = sessions.demo(video_id, "resume")?;
        demo.resume();
        Ok(demo.status())
    }

    pub async fn reset(&self, video_id: &str) -> Result<DemoStatus, PlaybackError> {
        let mut sessions = self.sessions.lock().await;
        let demo = sessions.demo(video_id, "reset")?;
        demo.reset();
        Ok(demo.status())
    }

    pub async fn frame(&self, video_id: &str) -> Result<DemoFrame, PlaybackError> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions.demo(video_id, "render")?.render())
    }

    /// Navigation away: drops the session and anything it holds.
    pub async fn leave(&self, video_id: &str) -> bool {
        self.sessions.lock().await.remove(video_id)
    }

    /// Drops every handle derived from the given record and its session.
    pub async fn invalidate(&self, video_id: &str) -> usize {
        let mut sessions = self.sessions.lock().await;
        let stale: Vec<Uuid> = sessions
            .handles
            .values()
            .filter(|h| h.video_id == video_id)
            .map(|h| h.id)
            .collect();
        for handle in &stale {
            sessions.release(*handle);
        }
        sessions.states.remove(video_id);
        stale.len()
    }

    /// Evicts idle sessions, then advances every playing demo by one frame.
    pub async fn tick_all(&self) {
        let mut sessions = self.sessions.lock().await;
        let evicted = sessions.evict_idle(self.limits.idle_timeout);
        if evicted > 0 {
            log::debug!("Evicted {} idle playback session(s)", evicted);
        }
        for session in sessions.states.values_mut() {
            if let PlaybackState::AnimatingDemo(demo) = &mut session.state {
                demo.tick();
            }
        }
    }

    /// Reports a session. Terminal `ended` and `not_found` sessions are
    /// dropped once reported.
    pub async fn snapshot(&self, video_id: &str) -> Result<SessionSnapshot, PlaybackError> {
        let mut sessions = self.sessions.lock().await;
        let state: &PlaybackState = sessions.state(video_id)?;

        let snapshot = SessionSnapshot {
            video_id: video_id.to_string(),
            state: state.name(),
            handle: match state {
                PlaybackState::PlayingReal { handle } => Some(*handle),
                _ => None,
            },
            demo: match state {
                PlaybackState::AnimatingDemo(demo) => Some(demo.status()),
                _ => None,
            },
            error: match state {
                PlaybackState::Errored { reason } => Some(reason.clone()),
                _ => None,
            },
        };
        let terminal = matches!(state, PlaybackState::Ended | PlaybackState::NotFound);

        if terminal {
            sessions.states.remove(video_id);
        }
        Ok(snapshot)
    }

    /// Looks up a live handle; released handles are gone.
    pub async fn handle(&self, id: Uuid) -> Option<PlaybackHandle> {
        self.sessions.lock().await.handles.get(&id).cloned()
    }

    pub async fn live_handles(&self) -> usize {
        self.sessions.lock().await.handles.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.states.len()
    }

    fn playing_handle(
        &self,
        sessions: &mut Sessions,
        video_id: &str,
        action: &'static str,
    ) -> Result<Uuid, PlaybackError> {
        match sessions.state(video_id)? {
            PlaybackState::PlayingReal { handle } => Ok(*handle),
            other => Err(PlaybackError::InvalidTransition {
                video_id: video_id.to_string(),
                state: other.name(),
                action,
            }),
        }
    }

    fn demo_for(&self, video_id: &str, title: Option<&str>, category: Option<String>) -> DemoLoop {
        let kind = DemoKind::select(video_id, title);
        let label = match (kind, title) {
            (_, Some(title)) => title.to_string(),
            (DemoKind::Squat, None) => "Dumbbell Squats".to_string(),
            (DemoKind::CurtsyLunge, None) => "DB Curtsy Lunge".to_string(),
            (DemoKind::Pulse, None) => "Exercise Demo".to_string(),
        };
        DemoLoop::new(kind, label, category, self.loop_period)
    }
}

/// Drives demo animation at the given rate. The task ends once the
/// resolver has been dropped.
pub fn spawn_demo_clock(resolver: &Arc<PlaybackResolver>, frames_per_second: u32) -> tokio::task::JoinHandle<()> {
    let resolver: Weak<PlaybackResolver> = Arc::downgrade(resolver);
    let period = Duration::from_secs(1) / frames_per_second.max(1);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match resolver.upgrade() {
                Some(resolver) => resolver.tick_all().await,
                None => break,
            }
        }
        log::debug!("Demo clock stopped");
    })
}

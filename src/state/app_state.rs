//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{CarouselState, Direction};
use crate::{
    config::Config,
    scheduling::{lock, AutoplayController, AutoplayOptions, Host, ToastQueue},
};

/// Main application state shared by the HTTP handlers and background tasks
#[derive(Debug)]
pub struct AppState {
    /// Autoplay driving the carousel
    pub autoplay: AutoplayController,
    /// Text notifications shown one at a time
    pub toasts: ToastQueue<String>,
    pub carousel: Arc<Mutex<CarouselState>>,
    /// Toast duration used when a request does not name one
    pub default_toast_duration: Duration,
    /// Exit transition length for hidden toasts
    pub fade: Duration,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Create the state from the configuration, scheduling on `scheduler`
    pub fn new(scheduler: Arc<dyn Host>, config: &Config) -> Self {
        let options = AutoplayOptions::new(config.interval())
            .enabled(!config.no_autoplay)
            .on_start(|| info!("Carousel autoplay running"))
            .on_stop(|| info!("Carousel autoplay halted"));

        Self {
            autoplay: AutoplayController::new(Arc::clone(&scheduler), options),
            toasts: ToastQueue::new(scheduler),
            carousel: Arc::new(Mutex::new(CarouselState::new(config.slides))),
            default_toast_duration: config.toast_duration(),
            fade: config.fade(),
            start_time: Instant::now(),
            port: config.port,
            host: config.host.clone(),
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Remember the most recent client command
    pub fn record_action(&self, action: &str) {
        *lock(&self.last_action) = Some(action.to_string());
        *lock(&self.last_action_time) = Some(Utc::now());
    }

    /// Current carousel position
    pub fn carousel(&self) -> CarouselState {
        lock(&self.carousel).clone()
    }

    /// Advance the carousel on an autoplay tick and restart the countdown
    pub fn advance_carousel(&self) -> CarouselState {
        let carousel = {
            let mut carousel = lock(&self.carousel);
            carousel.autoplay_step();
            carousel.clone()
        };
        debug!("Autoplay advanced carousel to slide {}", carousel.position);
        self.autoplay.reset();
        carousel
    }

    /// Navigate manually; the autoplay countdown starts over from zero
    pub fn navigate(&self, direction: Direction) -> CarouselState {
        let carousel = {
            let mut carousel = lock(&self.carousel);
            carousel.step(direction);
            carousel.clone()
        };
        info!("Carousel moved {:?} to slide {}", direction, carousel.position);
        self.autoplay.reset();
        carousel
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = lock(&self.last_action).clone();
        let last_action_time = *lock(&self.last_action_time);
        (last_action, last_action_time)
    }
}

#![allow(clippy::unwrap_used, dead_code)]
// Shared fakes for the polling-core integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use tuyadash_core::{
    ControlRef, CoreError, DashboardView, Device, DeviceBackend, DeviceCard, DeviceCommand,
    DeviceId, Status, StatusValue,
};

// ── Fixtures ────────────────────────────────────────────────────────

pub fn id(s: &str) -> DeviceId {
    DeviceId::from(s)
}

pub fn plug(device_id: &str, name: Option<&str>, on: bool) -> Device {
    Device {
        id: id(device_id),
        name: name.map(str::to_owned),
        product_name: Some("Smart Plug".into()),
        online: Some(true),
        status: vec![
            Status {
                code: "switch_1".into(),
                value: StatusValue::Bool(on),
            },
            Status {
                code: "cur_power".into(),
                value: StatusValue::Number(12.0),
            },
        ],
    }
}

// ── FakeBackend ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBehavior {
    Accept,
    Reject,
    TransportError,
}

/// Scripted backend that records every call with its (paused-clock) time.
pub struct FakeBackend {
    devices: Mutex<HashMap<DeviceId, Device>>,
    list: Mutex<Result<Vec<Device>, String>>,
    fail_reads: AtomicBool,
    ignore_cancel: AtomicBool,
    read_latency: Mutex<Duration>,
    write: Mutex<WriteBehavior>,
    reads: Mutex<Vec<(DeviceId, Instant)>>,
    writes: Mutex<Vec<(DeviceId, DeviceCommand)>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            list: Mutex::new(Ok(Vec::new())),
            fail_reads: AtomicBool::new(false),
            ignore_cancel: AtomicBool::new(false),
            read_latency: Mutex::new(Duration::ZERO),
            write: Mutex::new(WriteBehavior::Accept),
            reads: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
        }
    }
}

impl FakeBackend {
    pub fn with_devices(devices: Vec<Device>) -> Self {
        let backend = Self::default();
        backend.set_list(Ok(devices.clone()));
        for device in devices {
            backend.put(device);
        }
        backend
    }

    pub fn put(&self, device: Device) {
        self.devices.lock().unwrap().insert(device.id.clone(), device);
    }

    pub fn set_list(&self, list: Result<Vec<Device>, String>) {
        *self.list.lock().unwrap() = list;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Keep answering reads after cancellation, like a racy transport.
    pub fn ignore_cancel(&self, ignore: bool) {
        self.ignore_cancel.store(ignore, Ordering::SeqCst);
    }

    pub fn set_read_latency(&self, latency: Duration) {
        *self.read_latency.lock().unwrap() = latency;
    }

    pub fn set_write(&self, behavior: WriteBehavior) {
        *self.write.lock().unwrap() = behavior;
    }

    pub fn read_times(&self) -> Vec<Instant> {
        self.reads.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub fn read_count(&self) -> usize {
        self.reads.lock().unwrap().len()
    }

    pub fn writes(&self) -> Vec<(DeviceId, DeviceCommand)> {
        self.writes.lock().unwrap().clone()
    }

    fn answer(&self, id: &DeviceId) -> Result<Device, CoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CoreError::Api {
                message: "HTTP 503".into(),
                status: Some(503),
            });
        }
        self.devices
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: id.to_string(),
            })
    }
}

impl DeviceBackend for FakeBackend {
    async fn list_devices(&self, _page_size: Option<u32>) -> Result<Vec<Device>, CoreError> {
        let list = self.list.lock().unwrap().clone();
        list.map_err(|message| CoreError::Api {
            message,
            status: None,
        })
    }

    async fn get_device(
        &self,
        id: &DeviceId,
        cancel: &CancellationToken,
    ) -> Result<Device, CoreError> {
        self.reads.lock().unwrap().push((id.clone(), Instant::now()));
        let latency = *self.read_latency.lock().unwrap();
        let honour_cancel = !self.ignore_cancel.load(Ordering::SeqCst);

        if honour_cancel {
            if cancel.is_cancelled() {
                return Err(CoreError::Cancelled);
            }
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(CoreError::Cancelled),
                () = tokio::time::sleep(latency) => {}
            }
        } else {
            tokio::time::sleep(latency).await;
        }
        self.answer(id)
    }

    async fn send_command(&self, id: &DeviceId, command: &DeviceCommand) -> Result<bool, CoreError> {
        self.writes.lock().unwrap().push((id.clone(), command.clone()));
        let behavior = *self.write.lock().unwrap();
        match behavior {
            WriteBehavior::Accept => Ok(true),
            WriteBehavior::Reject => Ok(false),
            WriteBehavior::TransportError => Err(CoreError::ConnectionFailed {
                url: "http://backend".into(),
                reason: "connection refused".into(),
            }),
        }
    }
}

// ── RecordingView ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    ShowLoading,
    HideLoading,
    Clear,
    Empty(String),
    Error(String),
    Render(Vec<DeviceId>),
    Replace(DeviceCard),
    BeginPending(ControlRef, bool),
    EndPending(ControlRef),
}

/// View that records every call and tracks which cards are displayed.
#[derive(Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
    displayed: Mutex<HashSet<DeviceId>>,
}

impl RecordingView {
    /// A view already showing cards for these devices.
    pub fn showing(ids: &[&str]) -> Self {
        let view = Self::default();
        view.displayed
            .lock()
            .unwrap()
            .extend(ids.iter().map(|s| id(s)));
        view
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn replacements(&self) -> Vec<DeviceCard> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Replace(card) => Some(card),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ViewEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl DashboardView for RecordingView {
    fn show_loading(&self) {
        self.push(ViewEvent::ShowLoading);
    }

    fn hide_loading(&self) {
        self.push(ViewEvent::HideLoading);
    }

    fn clear(&self) {
        self.displayed.lock().unwrap().clear();
        self.push(ViewEvent::Clear);
    }

    fn show_empty(&self, message: &str) {
        self.push(ViewEvent::Empty(message.to_owned()));
    }

    fn show_error(&self, message: &str) {
        self.push(ViewEvent::Error(message.to_owned()));
    }

    fn render_cards(&self, cards: Vec<DeviceCard>) {
        let ids: Vec<DeviceId> = cards.iter().map(|c| c.device_id.clone()).collect();
        self.displayed.lock().unwrap().extend(ids.iter().cloned());
        self.push(ViewEvent::Render(ids));
    }

    fn has_card(&self, id: &DeviceId) -> bool {
        self.displayed.lock().unwrap().contains(id)
    }

    fn replace_card(&self, card: DeviceCard) {
        if self.has_card(&card.device_id) {
            self.push(ViewEvent::Replace(card));
        }
    }

    fn begin_pending(&self, control: &ControlRef, target: bool) {
        self.push(ViewEvent::BeginPending(control.clone(), target));
    }

    fn end_pending(&self, control: &ControlRef) {
        self.push(ViewEvent::EndPending(control.clone()));
    }
}

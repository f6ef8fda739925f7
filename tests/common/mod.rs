#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
    time::Duration,
};

use dicom_dictionary_std::tags;
use dicom_dualview::{
    DecodedImage, ImageDecodeService, ImageId, Scheduler, SourceFile, TimerHandle,
    canvas::Canvas,
    decode::{DecodeError, ViewportError},
    window_level::WindowLevel,
};
use ndarray::Array2;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Register(String),
    Decode(ImageId),
    Paint {
        canvas: String,
        image: String,
        window: WindowLevel,
    },
    Resize {
        canvas: String,
        force: bool,
    },
    Yield,
    Delay(Duration),
    ScheduleOnce(Duration),
    ScheduleInterval(Duration),
    Cancel(TimerHandle),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Decode service over fake payloads. A payload is the file's own name:
/// names starting with `bad` fail to register, names starting with
/// `nodecode` register but cannot be decoded, and names starting with
/// `norows` decode without reporting their dimensions.
pub struct FakeDecodeService {
    events: EventLog,
    payloads: RefCell<Vec<String>>,
    fail_paint: Cell<bool>,
    embedded_window: Cell<Option<WindowLevel>>,
}

impl FakeDecodeService {
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            payloads: RefCell::new(Vec::new()),
            fail_paint: Cell::new(false),
            embedded_window: Cell::new(None),
        }
    }

    pub fn set_fail_paint(&self, fail: bool) {
        self.fail_paint.set(fail);
    }

    pub fn set_embedded_window(&self, window: Option<WindowLevel>) {
        self.embedded_window.set(window);
    }

    fn log(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl ImageDecodeService for FakeDecodeService {
    fn register(&self, data: &[u8]) -> Result<ImageId, DecodeError> {
        let payload = String::from_utf8_lossy(data).to_string();
        self.log(Event::Register(payload.clone()));
        if payload.starts_with("bad") {
            return Err(DecodeError::NotDecodable(payload));
        }
        let mut payloads = self.payloads.borrow_mut();
        payloads.push(payload);
        Ok(ImageId(payloads.len() as u64 - 1))
    }

    fn decode(&self, id: ImageId) -> Result<Rc<DecodedImage>, DecodeError> {
        self.log(Event::Decode(id));
        let payload = self
            .payloads
            .borrow()
            .get(id.0 as usize)
            .cloned()
            .ok_or(DecodeError::UnknownImage(id))?;
        if payload.starts_with("nodecode") {
            return Err(DecodeError::PixelData(payload));
        }
        let mut image = DecodedImage::new(Array2::from_elem((4, 4), 100.0));
        if payload.starts_with("norows") {
            image.rows = None;
            image.columns = None;
        }
        image.window = self.embedded_window.get();
        image.raw_tags.insert(tags::SERIES_DESCRIPTION, payload);
        image
            .raw_tags
            .insert(tags::PIXEL_SPACING, "0.5\\0.5".to_string());
        Ok(Rc::new(image))
    }

    fn paint(
        &self,
        canvas: &mut Canvas,
        image: &DecodedImage,
        window: WindowLevel,
    ) -> Result<(), ViewportError> {
        if self.fail_paint.get() || canvas.size().is_empty() {
            return Err(ViewportError::zero_sized(canvas));
        }
        canvas.draw_image(&image.pixels, window);
        self.log(Event::Paint {
            canvas: canvas.label().to_string(),
            image: image
                .raw_tag(tags::SERIES_DESCRIPTION)
                .unwrap_or_default()
                .to_string(),
            window,
        });
        Ok(())
    }

    fn resize(&self, canvas: &mut Canvas, force: bool) -> Result<(), ViewportError> {
        if canvas.bounding_box().is_empty() {
            return Err(ViewportError::zero_sized(canvas));
        }
        canvas.sync_to_layout(force);
        self.log(Event::Resize {
            canvas: canvas.label().to_string(),
            force,
        });
        Ok(())
    }
}

/// Completes on the second poll, handing the executor one turn.
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Once,
    Interval,
}

/// Scheduler whose timers only fire when a test says so.
pub struct FakeScheduler {
    events: EventLog,
    next_id: Cell<u64>,
    timers: RefCell<Vec<(TimerHandle, TimerKind, Duration)>>,
}

impl FakeScheduler {
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            next_id: Cell::new(0),
            timers: RefCell::new(Vec::new()),
        }
    }

    fn add(&self, kind: TimerKind, duration: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id.get());
        self.next_id.set(handle.0 + 1);
        self.timers.borrow_mut().push((handle, kind, duration));
        handle
    }

    pub fn timers(&self, kind: TimerKind) -> Vec<(TimerHandle, Duration)> {
        self.timers
            .borrow()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(handle, _, duration)| (*handle, *duration))
            .collect()
    }

    pub fn active_timers(&self) -> usize {
        self.timers.borrow().len()
    }
}

impl Scheduler for FakeScheduler {
    fn yield_once(&self) -> impl Future<Output = ()> {
        self.events.borrow_mut().push(Event::Yield);
        YieldNow { yielded: false }
    }

    fn delay(&self, duration: Duration) -> impl Future<Output = ()> {
        self.events.borrow_mut().push(Event::Delay(duration));
        std::future::ready(())
    }

    fn schedule_once(&self, delay: Duration) -> TimerHandle {
        self.events.borrow_mut().push(Event::ScheduleOnce(delay));
        self.add(TimerKind::Once, delay)
    }

    fn schedule_interval(&self, period: Duration) -> TimerHandle {
        self.events
            .borrow_mut()
            .push(Event::ScheduleInterval(period));
        self.add(TimerKind::Interval, period)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.events.borrow_mut().push(Event::Cancel(handle));
        self.timers.borrow_mut().retain(|(h, _, _)| *h != handle);
    }
}

/// Source files whose payload is their own name.
pub fn files(names: &[&str]) -> Vec<SourceFile> {
    names
        .iter()
        .map(|name| SourceFile::new(*name, name.as_bytes().to_vec()))
        .collect()
}

/// `count` files named `{prefix}{n}.dcm`, n = 1..=count, in reverse order.
pub fn numbered_files(prefix: &str, count: usize) -> Vec<SourceFile> {
    let names: Vec<String> = (1..=count)
        .rev()
        .map(|n| format!("{prefix}{n}.dcm"))
        .collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    files(&names)
}

pub fn paints_on(events: &EventLog, canvas: &str) -> Vec<Event> {
    events
        .borrow()
        .iter()
        .filter(|event| matches!(event, Event::Paint { canvas: c, .. } if c == canvas))
        .cloned()
        .collect()
}

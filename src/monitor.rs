//! Background polling of section snapshots.
//!
//! A presentation layer typically wants the section values refreshed on a
//! timer and on demand. [`Monitor`] runs a worker thread that owns the device
//! client exclusively, so refreshes can never overlap and every poll is a
//! fully serialized transaction. Readings are delivered through a callback,
//! one per configured section per refresh pass.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::psu::{CpxPsu, Section};
use crate::transport::Transport;

/// What the monitor needs from a device client.
///
/// [`CpxPsu`] implements this; tests substitute a fake.
pub trait Access {
    fn section(&mut self, section: u32) -> Result<Section>;
}

impl<T: Transport> Access for CpxPsu<T> {
    fn section(&mut self, section: u32) -> Result<Section> {
        CpxPsu::section(self, section)
    }
}

enum Request {
    Refresh,
    Period(Option<Duration>),
    Shutdown,
}

/// Handle to the polling worker. Dropping it stops the worker and joins it.
pub struct Monitor {
    requests: Sender<Request>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Monitor {
    /// Start polling the given sections.
    ///
    /// The worker starts idle; call [`Monitor::refresh`] for a one-shot pass
    /// or [`Monitor::start_periodic`] to poll on a timer. Fails with
    /// [`Error::NoSections`] when `sections` is empty.
    pub fn spawn<A, F>(mut access: A, sections: Vec<u32>, mut on_reading: F) -> Result<Self>
    where
        A: Access + Send + 'static,
        F: FnMut(u32, Result<Section>) + Send + 'static,
    {
        if sections.is_empty() {
            return Err(Error::NoSections);
        }
        let (requests, inbox) = mpsc::channel();
        let worker = thread::spawn(move || run(&mut access, &sections, &mut on_reading, &inbox));
        Ok(Self {
            requests,
            worker: Some(worker),
        })
    }

    /// Trigger one refresh pass over all configured sections.
    pub fn refresh(&self) {
        let _ = self.requests.send(Request::Refresh);
    }

    /// Refresh automatically every `period` until stopped.
    pub fn start_periodic(&self, period: Duration) {
        let _ = self.requests.send(Request::Period(Some(period)));
    }

    /// Stop the periodic timer; manual refreshes keep working.
    pub fn stop_periodic(&self) {
        let _ = self.requests.send(Request::Period(None));
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        let _ = self.requests.send(Request::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run<A, F>(access: &mut A, sections: &[u32], on_reading: &mut F, inbox: &Receiver<Request>)
where
    A: Access,
    F: FnMut(u32, Result<Section>),
{
    let mut period: Option<Duration> = None;
    loop {
        let request = match period {
            Some(timeout) => match inbox.recv_timeout(timeout) {
                Ok(request) => request,
                // Timer fired.
                Err(RecvTimeoutError::Timeout) => Request::Refresh,
                Err(RecvTimeoutError::Disconnected) => return,
            },
            None => match inbox.recv() {
                Ok(request) => request,
                Err(_) => return,
            },
        };
        match request {
            Request::Refresh => {
                for &section in sections {
                    on_reading(section, access.section(section));
                }
            }
            Request::Period(new_period) => period = new_period,
            Request::Shutdown => return,
        }
    }
}

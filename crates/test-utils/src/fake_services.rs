use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fanout::errors::FanoutError;
use fanout::service::{ServiceController, ServiceFuture};

#[derive(Debug, Clone, Copy)]
struct FakeService {
    running: bool,
    startable: bool,
}

/// In-memory service controller that records start attempts.
#[derive(Debug, Clone, Default)]
pub struct FakeServices {
    services: Arc<Mutex<HashMap<String, FakeService>>>,
    starts: Arc<Mutex<Vec<String>>>,
}

impl FakeServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(self, name: &str, running: bool, startable: bool) -> Self {
        self.services
            .lock()
            .unwrap()
            .insert(name.to_string(), FakeService { running, startable });
        self
    }

    pub fn start_calls(&self) -> Vec<String> {
        self.starts.lock().unwrap().clone()
    }
}

impl ServiceController for FakeServices {
    fn is_running<'a>(&'a self, service: &'a str) -> ServiceFuture<'a, bool> {
        Box::pin(async move {
            let map = self.services.lock().unwrap();
            match map.get(service) {
                Some(s) => Ok(s.running),
                None => Err(FanoutError::DependencyUnavailable {
                    service: service.to_string(),
                    reason: "unknown to fake".to_string(),
                }),
            }
        })
    }

    fn start<'a>(&'a self, service: &'a str) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            self.starts.lock().unwrap().push(service.to_string());
            let mut map = self.services.lock().unwrap();
            match map.get_mut(service) {
                Some(s) if s.startable => {
                    s.running = true;
                    Ok(())
                }
                _ => Err(anyhow::anyhow!("fake start of '{service}' refused").into()),
            }
        })
    }

    fn startup_timeout(&self, _service: &str) -> Duration {
        Duration::from_millis(50)
    }
}

use crate::detect::request::DetectorRequest;
use crate::detect::response::DetectorResponse;
use crate::engine::DetectorEndpoint;
use anyhow::{anyhow, Result};
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Out-of-process detector transport. Requests are parked in a one-slot
/// outbox that the detector polls; responses are pushed back in whenever the
/// detector finishes. Only the newest pending request is kept.
#[derive(Debug, Clone)]
pub struct ExternalServer {
    outbox: Arc<Mutex<Option<DetectorRequest>>>,
    responses: mpsc::Sender<DetectorResponse>,
}

impl ExternalServer {
    pub fn spawn(endpoint: DetectorEndpoint) -> (Self, JoinHandle<()>) {
        let DetectorEndpoint {
            mut requests,
            responses,
        } = endpoint;

        let server = Self {
            outbox: Arc::new(Mutex::new(None)),
            responses,
        };

        let outbox = server.outbox.clone();
        let handle = tokio::spawn(async move {
            while let Some(request) = requests.recv().await {
                if let Some(stale) = outbox.lock().replace(request) {
                    debug!("Detector never fetched request {}", stale.sequence);
                }
            }
        });

        (server, handle)
    }

    /// Takes the pending request, if the detector has not fetched it yet.
    pub fn request(&self) -> Option<DetectorRequest> {
        self.outbox.lock().take()
    }

    pub async fn response(&self, response: DetectorResponse) -> Result<()> {
        self.responses
            .send(response)
            .await
            .map_err(|_| anyhow!("Detection consumer is gone"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::detector_link;
    use starlight_media::Frame;
    use std::time::Duration;

    #[tokio::test]
    async fn keeps_only_newest_request() {
        let (sender, endpoint, mut responses) = detector_link(4);
        let (server, _handle) = ExternalServer::spawn(endpoint);

        for sequence in 1..=3 {
            sender.submit(DetectorRequest {
                sequence,
                frame: Frame::gray(1, 1, vec![0]).unwrap(),
            });
        }

        let mut fetched = None;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if let Some(request) = server.request() {
                if request.sequence == 3 {
                    fetched = Some(request);
                    break;
                }
            }
        }
        assert_eq!(fetched.map(|request| request.sequence), Some(3));
        assert!(server.request().is_none());

        server
            .response(DetectorResponse::success(3, vec![]))
            .await
            .unwrap();
        assert_eq!(responses.recv().await.unwrap().sequence, Some(3));
    }
}

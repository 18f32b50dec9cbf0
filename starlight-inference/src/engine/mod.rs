use crate::detect::request::DetectorRequest;
use crate::detect::response::DetectorResponse;
use crate::detect::DetectResult;
use anyhow::Result;
use futures::future::BoxFuture;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

pub mod detector_link;

pub use detector_link::{detector_link, DetectorEndpoint};

/// An object detector reachable from this process.
pub trait Detector: Send + Sync + 'static {
    fn detect(&self, request: DetectorRequest) -> BoxFuture<'static, Result<Vec<DetectResult>>>;
}

/// Submitting side of the detector channel. Never waits: when the queue is
/// full the request is dropped.
#[derive(Debug, Clone)]
pub struct DetectorSender(mpsc::Sender<DetectorRequest>);

impl DetectorSender {
    pub fn new(sender: mpsc::Sender<DetectorRequest>) -> Self {
        Self(sender)
    }

    pub fn submit(&self, request: DetectorRequest) -> bool {
        let sequence = request.sequence;
        match self.0.try_send(request) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Detector queue full, dropped request {}", sequence);
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Detector channel closed, dropped request {}", sequence);
                false
            }
        }
    }
}

/// Drives an in-process [`Detector`]: every request gets its own task, so a
/// slow detection never holds back the next one and responses may arrive out
/// of order.
pub fn spawn_detector_bridge<D: Detector>(
    detector: Arc<D>,
    endpoint: DetectorEndpoint,
) -> JoinHandle<()> {
    let DetectorEndpoint {
        mut requests,
        responses,
    } = endpoint;

    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            let detector = detector.clone();
            let responses = responses.clone();

            tokio::spawn(async move {
                let sequence = request.sequence;
                let response = match detector.detect(request).await {
                    Ok(predictions) => DetectorResponse::success(sequence, predictions),
                    Err(e) => DetectorResponse::failure(Some(sequence), e.to_string()),
                };

                if responses.send(response).await.is_err() {
                    debug!("Response for request {} has no receiver", sequence);
                }
            });
        }
        debug!("Detector bridge stopped");
    })
}

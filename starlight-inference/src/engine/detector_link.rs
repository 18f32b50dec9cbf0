use crate::detect::request::DetectorRequest;
use crate::detect::response::DetectorResponse;
use crate::engine::DetectorSender;
use tokio::sync::mpsc;

const RESPONSE_QUEUE: usize = 16;

/// The detector's side of the link: where requests come out and responses go in.
#[derive(Debug)]
pub struct DetectorEndpoint {
    pub requests: mpsc::Receiver<DetectorRequest>,
    pub responses: mpsc::Sender<DetectorResponse>,
}

/// Creates the request/response channel pair between the analysis loop and a
/// detector. `queue` bounds how many requests may wait for the detector.
pub fn detector_link(
    queue: usize,
) -> (
    DetectorSender,
    DetectorEndpoint,
    mpsc::Receiver<DetectorResponse>,
) {
    let (request_tx, request_rx) = mpsc::channel(queue.max(1));
    let (response_tx, response_rx) = mpsc::channel(RESPONSE_QUEUE);

    (
        DetectorSender::new(request_tx),
        DetectorEndpoint {
            requests: request_rx,
            responses: response_tx,
        },
        response_rx,
    )
}

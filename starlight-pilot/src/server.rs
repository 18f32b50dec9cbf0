use crate::drive::{Goal, Obstacle};
use crate::follow::CameraPose;
use crate::pipeline::{CycleOutput, FollowerCommand, FollowerStatus, PilotHandle};
use actix_web::web::{self, Bytes, Data, Json, Query};
use actix_web::{http::StatusCode, App, HttpResponse, HttpServer, Responder};
use anyhow::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use starlight_inference::detect::response::DetectorResponse;
use starlight_inference::external::ExternalServer;
use starlight_media::{Frame, FrameSlot};

/// Largest accepted frame body, enough for a 4K RGBA readback.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppState {
    pub frames: FrameSlot,
    pub detector: ExternalServer,
    pub pilot: PilotHandle,
}

#[derive(Debug, Deserialize)]
struct FrameQuery {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct AutonomousQuery {
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct StateResponse {
    output: Option<CycleOutput>,
    follower: FollowerStatus,
    goal: Option<Goal>,
    obstacles: Vec<Obstacle>,
}

fn json_error(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({ "error": message.into() }))
}

async fn post_frame(state: Data<AppState>, query: Query<FrameQuery>, body: Bytes) -> impl Responder {
    match Frame::rgba(query.width, query.height, body.to_vec()) {
        Ok(frame) => {
            state.frames.publish(frame);
            HttpResponse::Accepted().finish()
        }
        Err(e) => json_error(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

async fn get_state(state: Data<AppState>) -> impl Responder {
    let pilot = &state.pilot;
    HttpResponse::Ok().json(StateResponse {
        output: pilot.latest_output().map(|output| output.as_ref().clone()),
        follower: pilot.follower_status(),
        goal: pilot.goal(),
        obstacles: pilot.obstacles().as_ref().clone(),
    })
}

async fn post_goal(state: Data<AppState>, goal: Json<Goal>) -> impl Responder {
    let goal = goal.into_inner();
    if !goal.screen_x.is_finite() || !goal.screen_y.is_finite() {
        return json_error(StatusCode::BAD_REQUEST, "Goal coordinates must be finite");
    }

    state.pilot.set_goal(Some(goal));
    HttpResponse::Ok().json(goal)
}

async fn delete_goal(state: Data<AppState>) -> impl Responder {
    state.pilot.set_goal(None);
    HttpResponse::NoContent().finish()
}

async fn get_detector_frame(state: Data<AppState>) -> impl Responder {
    let Some(request) = state.detector.request() else {
        return HttpResponse::NoContent().finish();
    };

    HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header(("x-sequence", request.sequence.to_string()))
        .insert_header(("x-width", request.width().to_string()))
        .insert_header(("x-height", request.height().to_string()))
        .insert_header(("x-channels", request.channels().to_string()))
        .body(request.to_bytes())
}

async fn post_detector_response(
    state: Data<AppState>,
    response: Json<DetectorResponse>,
) -> impl Responder {
    match state.detector.response(response.into_inner()).await {
        Ok(()) => HttpResponse::Accepted().finish(),
        Err(e) => json_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

async fn send_command(state: &AppState, command: FollowerCommand) -> HttpResponse {
    match state.pilot.command(command).await {
        Ok(()) => HttpResponse::Accepted().finish(),
        Err(e) => {
            warn!("{:?} not delivered: {}", command, e);
            json_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}

async fn post_follower_step(state: Data<AppState>) -> impl Responder {
    send_command(&state, FollowerCommand::Step).await
}

async fn post_follower_stop(state: Data<AppState>) -> impl Responder {
    send_command(&state, FollowerCommand::Stop).await
}

async fn post_follower_autonomous(
    state: Data<AppState>,
    query: Query<AutonomousQuery>,
) -> impl Responder {
    send_command(&state, FollowerCommand::SetAutonomous(query.enabled)).await
}

async fn post_camera_pose(state: Data<AppState>, pose: Json<CameraPose>) -> impl Responder {
    send_command(&state, FollowerCommand::SetPose(pose.into_inner())).await
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/frame", web::post().to(post_frame))
        .route("/state", web::get().to(get_state))
        .route("/goal", web::post().to(post_goal))
        .route("/goal", web::delete().to(delete_goal))
        .route("/camera/pose", web::post().to(post_camera_pose))
        .route("/detector/frame", web::get().to(get_detector_frame))
        .route("/detector/response", web::post().to(post_detector_response))
        .route("/follower/step", web::post().to(post_follower_step))
        .route("/follower/stop", web::post().to(post_follower_stop))
        .route("/follower/autonomous", web::post().to(post_follower_autonomous));
}

pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    info!("Listening on {}", bind);
    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(state.clone()))
            .app_data(web::PayloadConfig::new(MAX_FRAME_BYTES))
            .configure(routes)
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PilotConfig, Profile};
    use crate::follow::KinematicCamera;
    use crate::pipeline::Pilot;
    use actix_web::test as awtest;
    use serde_json::Value;
    use starlight_inference::detect::request::DetectorRequest;
    use starlight_inference::engine::detector_link;
    use std::time::Duration;

    fn test_state() -> (AppState, crate::pipeline::PilotTasks) {
        let frames = FrameSlot::new();
        let (sender, endpoint, responses) = detector_link(1);
        let (detector, _forwarder) = ExternalServer::spawn(endpoint);

        let mut config = PilotConfig::for_profile(Profile::Coarse);
        config.runtime.detector_input_size = (16, 16);
        let (pilot, tasks) = Pilot::spawn(
            config,
            frames.clone(),
            KinematicCamera::default(),
            sender,
            responses,
        )
        .unwrap();

        (
            AppState {
                frames,
                detector,
                pilot,
            },
            tasks,
        )
    }

    #[actix_web::test]
    async fn frame_with_wrong_length_is_rejected() {
        let (state, _tasks) = test_state();
        let app = awtest::init_service(
            App::new()
                .app_data(Data::new(state.clone()))
                .app_data(web::PayloadConfig::new(MAX_FRAME_BYTES))
                .configure(routes),
        )
        .await;

        let req = awtest::TestRequest::post()
            .uri("/frame?width=4&height=4")
            .set_payload(vec![0u8; 10])
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(state.frames.is_empty());

        let req = awtest::TestRequest::post()
            .uri("/frame?width=4&height=4")
            .set_payload(vec![0u8; 64])
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }

    #[actix_web::test]
    async fn goal_round_trips_through_state() {
        let (state, _tasks) = test_state();
        let app = awtest::init_service(App::new().app_data(Data::new(state)).configure(routes)).await;

        let req = awtest::TestRequest::post()
            .uri("/goal")
            .set_json(serde_json::json!({ "screen_x": 12.0, "screen_y": 4.0 }))
            .to_request();
        assert_eq!(awtest::call_service(&app, req).await.status(), StatusCode::OK);

        let req = awtest::TestRequest::get().uri("/state").to_request();
        let body: Value = awtest::call_and_read_body_json(&app, req).await;
        assert_eq!(body["goal"]["screen_x"], 12.0);
        assert_eq!(body["follower"]["state"], "Idle");

        let req = awtest::TestRequest::delete().uri("/goal").to_request();
        assert_eq!(awtest::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = awtest::TestRequest::get().uri("/state").to_request();
        let body: Value = awtest::call_and_read_body_json(&app, req).await;
        assert!(body["goal"].is_null());
    }

    #[actix_web::test]
    async fn detector_polls_frames_and_posts_results() {
        let (state, _tasks) = test_state();
        let app = awtest::init_service(App::new().app_data(Data::new(state.clone())).configure(routes)).await;

        let req = awtest::TestRequest::get().uri("/detector/frame").to_request();
        assert_eq!(awtest::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        // Hand a request to the outbox the way a cycle would.
        let (sender, endpoint, _responses) = detector_link(1);
        let (detector, _forwarder) = ExternalServer::spawn(endpoint);
        sender.submit(DetectorRequest {
            sequence: 9,
            frame: Frame::gray(2, 1, vec![7, 8]).unwrap(),
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let app = awtest::init_service(
            App::new()
                .app_data(Data::new(AppState {
                    detector,
                    ..state.clone()
                }))
                .configure(routes),
        )
        .await;

        let req = awtest::TestRequest::get().uri("/detector/frame").to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("x-sequence").unwrap(), "9");
        assert_eq!(resp.headers().get("x-channels").unwrap(), "1");
        let body = awtest::read_body(resp).await;
        assert_eq!(&body[..], &[0, 0, 0, 2, 0, 0, 0, 1, 7, 8]);

        let req = awtest::TestRequest::post()
            .uri("/detector/response")
            .set_json(serde_json::json!({ "sequence": 9, "predictions": [] }))
            .to_request();
        assert_eq!(awtest::call_service(&app, req).await.status(), StatusCode::ACCEPTED);
    }

    #[actix_web::test]
    async fn follower_commands_are_accepted() {
        let (state, _tasks) = test_state();
        let app = awtest::init_service(App::new().app_data(Data::new(state.clone())).configure(routes)).await;

        for uri in ["/follower/step", "/follower/stop", "/follower/autonomous?enabled=true"] {
            let req = awtest::TestRequest::post().uri(uri).to_request();
            assert_eq!(awtest::call_service(&app, req).await.status(), StatusCode::ACCEPTED);
        }

        let mut updates = state.pilot.follower_updates();
        tokio::time::timeout(Duration::from_secs(1), async {
            while !updates.borrow_and_update().autonomous {
                updates.changed().await.unwrap();
            }
        })
        .await
        .unwrap();
    }
}

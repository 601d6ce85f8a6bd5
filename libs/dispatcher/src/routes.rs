use actix_web::http::Method;
use actix_web::web::{Bytes, Data, Payload};
use actix_web::{get, post, HttpRequest, HttpResponse, ResponseError};
use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use litefunctions_broker::subject::{exec_subject, hook_subject, res_subject};
use litefunctions_common::{new_request_id, now_utc};

use crate::client::ActivationDescriptor;
use crate::error::DispatcherError;
use crate::path::{parse_hook_path, parse_lambda_path, parse_sse_path, parse_ws_path};
use crate::state::AppState;

/// Bound on the per-request channel bridging broker callbacks to the
/// response writer; overflow is dropped, not signalled to the client.
const STREAM_CHANNEL_CAPACITY: usize = 64;

fn check_method(expected: &str, actual: &Method) -> Result<(), DispatcherError> {
    if expected.eq_ignore_ascii_case(actual.as_str()) {
        Ok(())
    } else {
        Err(DispatcherError::MethodMismatch {
            expected: expected.to_uppercase(),
        })
    }
}

/// Common prelude shared by the three lambda endpoints: activate, then
/// validate the HTTP method against the function's declared one.
async fn activate_and_check(
    state: &AppState,
    name: &str,
    method: &Method,
) -> Result<ActivationDescriptor, DispatcherError> {
    let descriptor = state.scheduler.activate(&state.namespace, name).await?;
    check_method(&descriptor.method, method)?;
    Ok(descriptor)
}

/// `/lambda/<project>/<name>` — sync unary, async fire-and-forget, or a pure
/// HTTP proxy to a direct-HTTP-capable worker. Registered for every HTTP
/// method (not just POST): the method mismatch check happens against the
/// function's own declared method, not a fixed verb on this route.
pub async fn lambda_sync(
    req: HttpRequest,
    body: Bytes,
    state: Data<AppState>,
) -> Result<HttpResponse, DispatcherError> {
    let (project, name, tail) = parse_lambda_path(req.path());
    if project.is_empty() {
        return Err(DispatcherError::MalformedRequest(
            "expected /lambda/<project>/<name>".into(),
        ));
    }

    let descriptor = activate_and_check(&state, &name, req.method()).await?;

    if descriptor.is_async {
        state.metrics.record("async");
        let request_id = new_request_id();
        let subject = exec_subject(&project, &name, &descriptor.language, &request_id)?;
        state.broker.publish(subject, body).await?;
        return Ok(HttpResponse::Accepted().finish());
    }

    if let (Some(service_name), Some(port)) = (&descriptor.service_name, descriptor.service_port) {
        state.metrics.record("proxy");
        return proxy_to_worker(&state, &project, &name, service_name, port, &tail, &req, body)
            .await;
    }

    state.metrics.record("sync");
    let request_id = new_request_id();
    let exec = exec_subject(&project, &name, &descriptor.language, &request_id)?;
    let res = res_subject(&project, &name, &descriptor.language, &request_id)?;

    // Subscribe BEFORE publish, to avoid a lost reply (invariant I1).
    let mut sub = state.broker.subscribe(res).await?;
    state.broker.publish(exec, body).await?;
    let reply = tokio::time::timeout(state.reply_timeout, sub.next()).await;
    sub.close().await;

    match reply {
        Ok(Some(msg)) => Ok(HttpResponse::Ok().body(msg.payload)),
        _ => Err(DispatcherError::ReplyTimeout),
    }
}

#[allow(clippy::too_many_arguments)]
async fn proxy_to_worker(
    state: &AppState,
    project: &str,
    name: &str,
    service_name: &str,
    port: u16,
    tail: &str,
    req: &HttpRequest,
    body: Bytes,
) -> Result<HttpResponse, DispatcherError> {
    let query = req.query_string();
    let mut url = format!(
        "http://{service_name}.{}.svc.cluster.local:{port}{tail}",
        state.namespace
    );
    if !query.is_empty() {
        url.push('?');
        url.push_str(query);
    }

    let mut builder = state
        .http_client
        .request(req.method().clone(), &url)
        .header("X-Litefunction-Name", name)
        .header("X-Litefunction-Project", project);

    for (key, value) in req.headers() {
        if key == actix_web::http::header::HOST {
            continue;
        }
        builder = builder.header(key.as_str(), value.as_bytes());
    }

    let upstream = builder.body(body).send().await?;

    let mut response = HttpResponse::build(
        actix_web::http::StatusCode::from_u16(upstream.status().as_u16())
            .unwrap_or(actix_web::http::StatusCode::BAD_GATEWAY),
    );
    for (key, value) in upstream.headers() {
        response.insert_header((key.as_str(), value.as_bytes()));
    }
    let body = upstream.bytes().await?;
    Ok(response.body(body))
}

/// `GET /lambda/sse/<project>/<name>` — one request body, many responses,
/// streamed as raw bytes with no framing beyond the worker's own contract.
#[get("/lambda/sse/{tail:.*}")]
pub async fn lambda_sse(
    req: HttpRequest,
    body: Bytes,
    state: Data<AppState>,
) -> Result<HttpResponse, DispatcherError> {
    let (project, name, _tail) = parse_sse_path(req.path());
    if project.is_empty() {
        return Err(DispatcherError::MalformedRequest(
            "expected /lambda/sse/<project>/<name>".into(),
        ));
    }

    let descriptor = activate_and_check(&state, &name, req.method()).await?;
    state.metrics.record("sse");

    let request_id = new_request_id();
    let exec = exec_subject(&project, &name, &descriptor.language, &request_id)?;
    let res = res_subject(&project, &name, &descriptor.language, &request_id)?;

    let sub = state.broker.subscribe(res).await?;
    state.broker.publish(exec, body).await?;

    let metrics = state.metrics.clone();
    let rx = litefunctions_broker::bridge_bounded(sub, STREAM_CHANNEL_CAPACITY, move || {
        metrics.record_drop("sse");
    });
    let stream = ReceiverStream::new(rx).map(|chunk| Ok::<_, actix_web::Error>(chunk));

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("Connection", "keep-alive"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(stream))
}

/// `GET /lambda/ws/<project>/<name>` — bidirectional streaming: a reader
/// publishes every inbound frame, a subscriber forwards every res message as
/// a binary frame. Either side closing terminates both.
#[get("/lambda/ws/{tail:.*}")]
pub async fn lambda_ws(
    req: HttpRequest,
    stream: Payload,
    state: Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let (project, name, _tail) = parse_ws_path(req.path());
    if project.is_empty() {
        return Ok(DispatcherError::MalformedRequest(
            "expected /lambda/ws/<project>/<name>".into(),
        )
        .error_response());
    }

    let descriptor = match activate_and_check(&state, &name, req.method()).await {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    state.metrics.record("ws");

    let (response, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    let broker = state.broker.clone();
    let language = descriptor.language.clone();

    actix_web::rt::spawn(async move {
        let request_id = new_request_id();
        let Ok(exec) = exec_subject(&project, &name, &language, &request_id) else {
            return;
        };
        let Ok(res) = res_subject(&project, &name, &language, &request_id) else {
            return;
        };
        let Ok(mut sub) = broker.subscribe(res).await else {
            return;
        };

        let mut forward_session = session.clone();
        let forward_task = actix_web::rt::spawn(async move {
            while let Some(msg) = sub.next().await {
                if forward_session.binary(msg.payload).await.is_err() {
                    break;
                }
            }
            sub.close().await;
        });

        while let Some(Ok(msg)) = msg_stream.next().await {
            match msg {
                actix_ws::Message::Text(text) => {
                    let _ = broker.publish(exec.clone(), text.into_bytes()).await;
                }
                actix_ws::Message::Binary(bin) => {
                    let _ = broker.publish(exec.clone(), bin).await;
                }
                actix_ws::Message::Close(_) => break,
                actix_ws::Message::Ping(bytes) => {
                    let _ = session.pong(&bytes).await;
                }
                _ => {}
            }
        }

        forward_task.abort();
        let _ = session.close(None).await;
    });

    Ok(response)
}

/// `POST /hook/<language>/<project>` — runtime-initiated readiness signal.
#[post("/hook/{tail:.*}")]
pub async fn hook(req: HttpRequest, state: Data<AppState>) -> Result<HttpResponse, DispatcherError> {
    let (language, project) = parse_hook_path(req.path());
    if language.is_empty() {
        return Err(DispatcherError::MalformedRequest(
            "expected /hook/<language>/<project>".into(),
        ));
    }

    let subject = hook_subject(&project, &language)?;
    let payload = format!(r#"{{"timestamp":"{}"}}"#, now_utc().to_rfc3339());
    state.broker.publish(subject, payload.into_bytes().into()).await?;
    Ok(HttpResponse::Accepted().body("ok"))
}

#[get("/healthz")]
pub async fn healthz() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

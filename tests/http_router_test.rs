// ==========================================
// HTTP 路由冒烟测试
// ==========================================
// 通过 tower::ServiceExt::oneshot 驱动 axum Router
// ==========================================

mod helpers;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use academic_qa::app::build_router;
use helpers::api_test_helper::*;

const BOUNDARY: &str = "academic-qa-boundary";

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("请求失败");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("响应体不是 JSON")
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::empty()).unwrap()
}

fn multipart_request(uri: &str, token: &str, file_name: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = file_name,
        c = content
    );
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn login(router: &Router, username: &str) -> String {
    let (status, body) = send(
        router,
        json_request(
            Method::POST,
            "/api/users/login",
            None,
            json!({ "username": username, "password": "secreto123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "登录失败: {}", body);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let env = ApiTestEnv::new().unwrap();
    let router = build_router(env.state.clone());

    let (status, body) = send(&router, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let env = ApiTestEnv::new().unwrap();
    let router = build_router(env.state.clone());

    let (status, body) = send(&router, get("/api/pruebas", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send(&router, get("/api/programs", Some("Bearer basura"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_logout_flow() {
    let env = ApiTestEnv::new().unwrap();
    let router = build_router(env.state.clone());

    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            "/api/users/register",
            None,
            json!({
                "username": "coord",
                "cc": "42",
                "password": "secreto123",
                "nombres": "Carla",
                "correo": "coord@example.edu",
                "role": "Coordinador"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["user"]["role"], "Coordinador");
    assert!(body["user"].get("passwordHash").is_none());

    let token = login(&router, "coord").await;

    // 原始令牌（无 Bearer 前缀）同样可用
    let (status, users) = send(&router, get("/api/users", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);

    let (status, _) = send(&router, get("/api/users/logout/coord", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, get("/api/users", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token revocado");
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let env = ApiTestEnv::new().unwrap();
    let router = build_router(env.state.clone());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{no es json"))
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_prueba_flow_over_http() {
    let s = Scenario::new();
    let router = build_router(s.env.state.clone());
    let token = login(&router, "eval1").await;

    // 创建测评（西语字段名）
    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            "/api/pruebas/create-prueba",
            Some(&token),
            json!({
                "nombre": "Parcial HTTP",
                "programaId": s.program.id,
                "raIds": [s.outcome_a.id, s.outcome_b.id],
                "semestre": "2024-2",
                "descripcion": "Vía HTTP",
                "cantidadGrupos": 1,
                "usuarios": [s.evaluators[0].id]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let prueba_id = body["prueba"]["id"].as_str().unwrap().to_string();
    let group_id = body["prueba"]["groups"][0]["id"].as_str().unwrap().to_string();
    let group_uri = format!("/api/pruebas/{}/grupos/{}", prueba_id, group_id);

    // 导入名单
    let (status, body) = send(
        &router,
        multipart_request(
            &format!("{}/importar-estudiantes", group_uri),
            &token,
            "lista.csv",
            "Documento,Nombre\n123,Ana\n456,Luis\n",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["imported"], 2);

    // 表头错误
    let (status, body) = send(
        &router,
        multipart_request(
            &format!("{}/importar-estudiantes", group_uri),
            &token,
            "lista.csv",
            "Cedula,Alumno\n789,Marta\n",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // 查询分组并录入成绩
    let (status, body) = send(&router, get(&group_uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let students = body["group"]["students"].as_array().unwrap();
    assert_eq!(students.len(), 2);
    let ana_id = students[0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &router,
        json_request(
            Method::PUT,
            &format!("{}/estudiantes/{}", group_uri, ana_id),
            Some(&token),
            json!({ "notas": [{ "ra": s.outcome_a.id, "nota": 4.0 }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["student"]["grades"].as_array().unwrap().len(), 1);

    // 新建学生（upsert 未知 ID）返回 201
    let (status, _) = send(
        &router,
        json_request(
            Method::PUT,
            &format!("{}/estudiantes/nuevo", group_uri),
            Some(&token),
            json!({ "documento": "999", "nombre": "Zoe", "notas": [{ "ra": s.outcome_a.id, "nota": 2.0 }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&router, get(&format!("/api/pruebas/{}", prueba_id), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prueba"]["average"], 3.0);
    assert_eq!(body["prueba"]["groups"][0]["outcomeAverages"][0]["average"], 3.0);

    // 删除测评后 404
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/pruebas/{}", prueba_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, get(&format!("/api/pruebas/{}", prueba_id), Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_logins_do_not_block_other_requests() {
    let env = ApiTestEnv::new().unwrap();
    for username in ["eval1", "eval2", "eval3", "eval4"] {
        env.seed_user(username);
    }
    let router = build_router(env.state.clone());

    let logins: Vec<_> = ["eval1", "eval2", "eval3", "eval4"]
        .into_iter()
        .map(|username| {
            let router = router.clone();
            tokio::spawn(async move { login(&router, username).await })
        })
        .collect();

    let (status, body) = send(&router, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let mut tokens = Vec::new();
    for handle in logins {
        tokens.push(handle.await.expect("登录任务失败"));
    }
    assert_eq!(tokens.len(), 4);

    let (status, _) = send(&router, get("/api/users", Some(tokens[3].as_str()))).await;
    assert_eq!(status, StatusCode::OK);
}

//! End-to-end integration tests

#[cfg(test)]
mod tests {
    use axum::http::{header, Method, StatusCode};
    use std::sync::Arc;

    use crate::identity::derive_identifier;
    use crate::integration::fixtures::*;
    use crate::state::AppState;

    #[tokio::test]
    async fn test_scan_and_list() {
        let lib = Library::new();

        let response = lib.send(authed(Method::POST, "/api/scan", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let scan = body_json(response).await;
        assert_eq!(scan["success"], true);
        assert_eq!(scan["count"], 3);

        let listing = body_json(lib.send(authed(Method::GET, "/api/videos", None)).await).await;
        assert_eq!(listing["videoCount"], 3);
        assert_eq!(listing["dirCount"], 2);

        let videos = listing["videos"].as_array().unwrap();
        let names: Vec<&str> = videos.iter().map(|v| v["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["clip.mp4", "Other.MKV", "假期 video.webm"]);

        let nested = &videos[1];
        assert_eq!(nested["rootName"], "movies");
        assert_eq!(nested["relativePath"], "nested/Other.MKV");
        assert_eq!(nested["sizeBytes"], 10);
        assert_eq!(nested["size"], "10 B");
        assert_eq!(nested["id"], derive_identifier("movies", "nested/Other.MKV"));

        // Absolute paths never leave the server
        let raw = serde_json::to_string(&listing).unwrap();
        assert!(!raw.contains(lib.dir.path().to_str().unwrap()));
    }

    #[tokio::test]
    async fn test_identifiers_survive_restart() {
        let lib = Library::new();
        lib.scan().await;
        let before = body_json(lib.send(authed(Method::GET, "/api/videos", None)).await).await;

        // Second process over the same snapshot
        let config = Library::config(lib.dir.path(), lib.state.roots().to_vec());
        let restarted = Arc::new(AppState::new(config, None));
        assert_eq!(restarted.load_snapshot().await, 3);

        let id = before["videos"][0]["id"].as_str().unwrap();
        let key = restarted.identity.resolve(id).unwrap();
        assert_eq!(key.root_name, "movies");
        assert_eq!(key.relative_path, "clip.mp4");

        // Rescanning yields the same identifiers
        lib.scan().await;
        let after = body_json(lib.send(authed(Method::GET, "/api/videos", None)).await).await;
        assert_eq!(before["videos"], after["videos"]);
    }

    #[tokio::test]
    async fn test_gate() {
        let lib = Library::new();

        for (method, uri) in [
            (Method::GET, "/api/videos"),
            (Method::POST, "/api/scan"),
            (Method::GET, "/api/scan-status"),
            (Method::GET, "/api/favorites"),
        ] {
            let request = axum::http::Request::builder()
                .method(method)
                .uri(uri)
                .body(axum::body::Body::empty())
                .unwrap();
            let response = lib.send(request).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }

        let request = axum::http::Request::builder()
            .uri("/api/scan-status")
            .header(header::COOKIE, format!("sessionId={}", TOKEN))
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(lib.send(request).await.status(), StatusCode::OK);

        let request = axum::http::Request::builder()
            .uri("/api/scan-status")
            .header(header::AUTHORIZATION, "Bearer wrong")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(lib.send(request).await.status(), StatusCode::UNAUTHORIZED);

        // Streams are reachable with the identifier alone
        lib.scan().await;
        let id = lib.id("movies", "clip.mp4");
        let response = lib.send(get(&format!("/api/stream/{}", id))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_range_requests() {
        let lib = Library::new();
        lib.scan().await;
        let uri = format!("/api/stream/{}", lib.id("movies", "clip.mp4"));
        let data = pattern(CLIP_SIZE);

        let response = lib.send(get_range(&uri, "bytes=0-99")).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes 0-99/1000");
        assert_eq!(header_str(&response, header::CONTENT_LENGTH), "100");
        assert_eq!(header_str(&response, header::CONTENT_TYPE), "video/mp4");
        assert_eq!(body_bytes(response).await, &data[..100]);

        let response = lib.send(get_range(&uri, "bytes=900-1200")).await;
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes */1000");

        let response = lib.send(get_range(&uri, "bytes=500-")).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(header_str(&response, header::CONTENT_LENGTH), "500");
        assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes 500-999/1000");
        assert_eq!(body_bytes(response).await, &data[500..]);

        let response = lib.send(get(&uri)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(&response, header::ACCEPT_RANGES), "bytes");
        assert_eq!(header_str(&response, header::CONTENT_LENGTH), "1000");
        assert_eq!(header_str(&response, header::CACHE_CONTROL), "public, max-age=3600");
        assert_eq!(body_bytes(response).await, data);

        for bad in ["bytes=abc-", "bytes=-100", "bytes=10-5", "lines=0-1"] {
            let response = lib.send(get_range(&uri, bad)).await;
            assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE, "{}", bad);
        }
    }

    #[tokio::test]
    async fn test_download_disposition() {
        let lib = Library::new();
        lib.scan().await;
        let id = lib.id("shows", "假期 video.webm");

        let response = lib.send(get(&format!("/api/download/{}", id))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(&response, header::CONTENT_TYPE), "video/webm");
        assert_eq!(header_str(&response, header::CACHE_CONTROL), "no-cache");
        assert_eq!(
            header_str(&response, header::CONTENT_DISPOSITION),
            "attachment; filename*=UTF-8''%E5%81%87%E6%9C%9F%20video.webm"
        );
        assert_eq!(body_bytes(response).await, pattern(300));
    }

    #[tokio::test]
    async fn test_unknown_identifier() {
        let lib = Library::new();
        lib.scan().await;

        for id in ["ffffffffffffffff", "not-an-id", "../../etc/passwd"] {
            let response = lib.send(get(&format!("/api/stream/{}", id))).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", id);
        }

        let response = lib.send(get("/api/download/ffffffffffffffff")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_removed_file() {
        let lib = Library::new();
        lib.scan().await;
        let id = lib.id("movies", "clip.mp4");

        std::fs::remove_file(lib.path("movies/clip.mp4")).unwrap();

        assert!(lib.state.identity.resolve(&id).is_some());
        let stream = lib.send(get(&format!("/api/stream/{}", id))).await;
        assert_eq!(stream.status(), StatusCode::NOT_FOUND);
        let download = lib.send(get(&format!("/api/download/{}", id))).await;
        assert_eq!(download.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_scan_rejected_while_running() {
        let lib = Library::new();
        lib.scan().await;

        let permit = lib.state.catalog.try_begin_scan().unwrap();
        std::fs::write(lib.path("movies/new.mp4"), pattern(5)).unwrap();

        let scan = body_json(lib.send(authed(Method::POST, "/api/scan", None)).await).await;
        assert_eq!(scan["success"], true);
        assert_eq!(scan["started"], false);
        assert_eq!(scan["count"], 3);

        let status = body_json(lib.send(authed(Method::GET, "/api/scan-status", None)).await).await;
        assert_eq!(status["scanning"], true);
        assert_eq!(status["videoCount"], 3);
        drop(permit);

        let scan = body_json(lib.send(authed(Method::POST, "/api/scan", None)).await).await;
        assert_eq!(scan["started"], true);
        assert_eq!(scan["count"], 4);
    }

    #[tokio::test]
    async fn test_concurrent_scan_triggers() {
        let lib = Library::new();
        let (a, b) = tokio::join!(lib.state.rescan(), lib.state.rescan());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.started as u8 + b.started as u8, 1);
        assert_eq!(lib.state.metrics.scans_completed(), 1);
        assert_eq!(lib.state.catalog.snapshot().len(), 3);
    }

    #[tokio::test]
    async fn test_video_info() {
        let lib = Library::new();
        lib.scan().await;

        let response = lib.send(authed(Method::GET, "/api/video-info", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let id = lib.id("movies", "nested/Other.MKV");
        let uri = format!("/api/video-info?id={}", id);
        let info = body_json(lib.send(authed(Method::GET, &uri, None)).await).await;
        assert_eq!(info["id"], id.as_str());
        assert_eq!(info["rootName"], "movies");
        assert_eq!(info["relativePath"], "nested/Other.MKV");
        assert_eq!(info["filename"], "Other.MKV");
        assert_eq!(info["contentType"], "video/x-matroska");

        let response = lib
            .send(authed(Method::GET, "/api/video-info?id=0000000000000000", None))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_favorites_flow() {
        let lib = Library::new();
        lib.scan().await;
        let id = lib.id("movies", "clip.mp4");
        let check_uri = format!("/api/favorite/check/{}", id);

        let check = body_json(lib.send(authed(Method::GET, &check_uri, None)).await).await;
        assert_eq!(check["isFavorite"], false);

        let body = serde_json::json!({ "videoId": id, "rootName": "movies", "filename": "clip.mp4" });
        let added = body_json(lib.send(authed(Method::POST, "/api/favorite", Some(body.clone()))).await).await;
        assert_eq!(added["success"], true);
        let again = body_json(lib.send(authed(Method::POST, "/api/favorite", Some(body))).await).await;
        assert_eq!(again["success"], false);

        let list = body_json(lib.send(authed(Method::GET, "/api/favorites", None)).await).await;
        let favorites = list["favorites"].as_array().unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0]["videoId"], id.as_str());
        assert!(lib.path("data/favorites.json").exists());

        let missing = lib
            .send(authed(Method::POST, "/api/favorite", Some(serde_json::json!({}))))
            .await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let delete_uri = format!("/api/favorite/{}", id);
        let removed = body_json(lib.send(authed(Method::DELETE, &delete_uri, None)).await).await;
        assert_eq!(removed["success"], true);
        let check = body_json(lib.send(authed(Method::GET, &check_uri, None)).await).await;
        assert_eq!(check["isFavorite"], false);
    }

    #[tokio::test]
    async fn test_reload_without_config_file() {
        let lib = Library::new();
        let response = lib.send(authed(Method::POST, "/api/config/reload", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(lib.state.roots().len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_cycle_terminates() {
        let lib = Library::new();
        std::os::unix::fs::symlink(lib.path("movies"), lib.path("movies/nested/loop")).unwrap();

        assert_eq!(lib.scan().await, 3);
        let catalog = lib.state.catalog.snapshot();
        assert!(catalog
            .videos
            .iter()
            .all(|v| !v.relative_path.contains("loop")));
    }

    #[tokio::test]
    async fn test_empty_library() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("docs");
        std::fs::create_dir_all(&root).unwrap();
        for i in 0..5 {
            std::fs::write(root.join(format!("file{}.txt", i)), b"text").unwrap();
        }
        let config = Library::config(
            dir.path(),
            vec![crate::config::RootConfig::new("docs", &root)],
        );
        let state = Arc::new(AppState::new(config, None));

        let outcome = state.rescan().await.unwrap();
        assert!(outcome.started);
        assert_eq!(outcome.count, 0);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let lib = Library::new();
        lib.scan().await;
        let uri = format!("/api/stream/{}", lib.id("movies", "clip.mp4"));
        lib.send(get_range(&uri, "bytes=0-9")).await;
        lib.send(get_range(&uri, "bytes=5000-")).await;

        let response = lib.send(get("/metrics")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(text.contains("vidshelf_streams_partial_total 1"));
        assert!(text.contains("vidshelf_range_rejections_total 1"));
        assert!(text.contains("vidshelf_scans_completed_total 1"));
    }

    #[tokio::test]
    async fn test_over_real_socket() {
        let lib = Library::new();
        lib.scan().await;
        let id = lib.id("movies", "clip.mp4");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = lib.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/api/stream/{}", addr, id))
            .header("Range", "bytes=100-199")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 206);
        assert_eq!(
            response.headers()["content-range"].to_str().unwrap(),
            "bytes 100-199/1000"
        );
        let bytes = response.bytes().await.unwrap();
        assert_eq!(bytes.as_ref(), &pattern(CLIP_SIZE)[100..200]);

        let health = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(health.text().await.unwrap(), "OK");
    }
}

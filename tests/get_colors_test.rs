use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::thread;

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};

use image_colors::extractor::{
    ExtractorConfig, ImageColorsConfig, ImageColorsError, ImageColorsErrorPayload,
    ImageColorsHandler, ImageColorsService, Quality,
};

fn solid_png(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(width, height, Rgba(pixel));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("encode test png failed");
    cursor.into_inner()
}

/// 本地 HTTP 服务，只应答一次请求。
fn serve_once(status_line: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
    let port = listener.local_addr().expect("read local addr failed").port();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept failed");
        let mut req_buf = [0u8; 4096];
        let _ = stream.read(&mut req_buf);

        let head = format!(
            "HTTP/1.1 {}\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status_line,
            body.len()
        );
        stream.write_all(head.as_bytes()).expect("write headers failed");
        stream.write_all(&body).expect("write body failed");
        stream.flush().expect("flush failed");
    });

    format!("http://127.0.0.1:{}/cover.png", port)
}

fn handler() -> ImageColorsHandler {
    ImageColorsHandler::new(ExtractorConfig::default()).expect("handler init failed")
}

#[tokio::test]
async fn remote_solid_image_yields_its_color_for_every_query() {
    let url = serve_once("200 OK", solid_png(50, 30, [200, 30, 40, 255]));

    let result = handler().get_colors(&url, None).await.expect("remote pipeline");
    let colors = result.as_harmony().expect("harmony result");

    assert_eq!(colors.main_color, "#c81e28");
    assert_eq!(colors.largest_proportion_color, "#c81e28");
    assert_eq!(colors.highest_saturation_color, "#c81e28");
    assert_eq!(colors.average_color, "#c81e28");
}

#[tokio::test]
async fn remote_error_status_surfaces_network_error() {
    let url = serve_once("500 Internal Server Error", b"boom".to_vec());

    let err = handler().get_colors(&url, None).await.expect_err("500 must fail");
    assert!(matches!(err, ImageColorsError::Network(_)));

    let payload = ImageColorsErrorPayload::from(&err);
    assert_eq!(payload.code, "E_NETWORK");
    assert_eq!(payload.stage, "load");
    assert!(payload.message.contains("500"));
}

#[tokio::test]
async fn asset_uri_resolves_under_asset_root() {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::create_dir_all(dir.path().join("assets/covers")).expect("create assets dir");
    std::fs::write(dir.path().join("assets/covers/blue.png"), solid_png(20, 20, [0, 0, 255, 255]))
        .expect("write asset");

    let config = ExtractorConfig {
        asset_root: dir.path().to_path_buf(),
        ..ExtractorConfig::default()
    };
    let handler = ImageColorsHandler::new(config).expect("handler init failed");

    let result = handler.get_colors("asset://covers/blue.png", None).await.expect("asset pipeline");
    assert_eq!(result.as_harmony().expect("harmony").main_color, "#0000ff");

    let missing = handler.get_colors("asset://covers/none.png", None).await;
    assert!(matches!(missing, Err(ImageColorsError::Asset(_))));
}

#[tokio::test]
async fn base64_data_uri_is_decoded() {
    let png = solid_png(8, 8, [16, 160, 64, 255]);
    let uri = format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(&png));
    let options = ImageColorsConfig {
        quality: Quality::Highest,
        ..ImageColorsConfig::default()
    };

    let result = handler().get_colors(&uri, Some(&options)).await.expect("inline pipeline");
    assert_eq!(result.as_harmony().expect("harmony").average_color, "#10a040");
}

#[tokio::test]
async fn transparent_image_falls_back_for_every_query() {
    let png = solid_png(10, 10, [255, 255, 255, 0]);
    let uri = format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(&png));
    let options = ImageColorsConfig {
        fallback: Some("#abc".to_string()),
        quality: Quality::Highest,
        ..ImageColorsConfig::default()
    };

    let result = handler().get_colors(&uri, Some(&options)).await.expect("pipeline succeeds");
    let colors = result.as_harmony().expect("harmony result");

    assert_eq!(colors.main_color, "#aabbcc");
    assert_eq!(colors.largest_proportion_color, "#aabbcc");
    assert_eq!(colors.highest_saturation_color, "#aabbcc");
    assert_eq!(colors.average_color, "#aabbcc");
}

#[tokio::test]
async fn empty_fallback_and_unknown_quality_use_defaults() {
    let png = solid_png(10, 10, [255, 255, 255, 0]);
    let uri = format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(&png));
    let options: ImageColorsConfig =
        serde_json::from_str(r#"{"fallback":"","quality":"Highest"}"#).expect("parse options");

    assert_eq!(options.quality, Quality::Low);

    let result = handler().get_colors(&uri, Some(&options)).await.expect("pipeline succeeds");
    assert_eq!(result.as_harmony().expect("harmony").main_color, "#000000");
}

#[tokio::test]
async fn result_serializes_with_harmony_platform_tag() {
    let url = serve_once("200 OK", solid_png(10, 10, [1, 2, 3, 255]));

    let result = handler().get_colors(&url, None).await.expect("remote pipeline");
    let value = serde_json::to_value(&result).expect("serialize result");

    assert_eq!(value["platform"], "harmony");
    assert_eq!(value["averageColor"], "#010203");
}

#[tokio::test]
async fn cached_remote_result_is_served_without_second_request() {
    // 服务只应答一次，第二次若真正发起请求必然失败
    let url = serve_once("200 OK", solid_png(10, 10, [90, 90, 200, 255]));
    let service = ImageColorsService::new().expect("service init failed");
    let options = ImageColorsConfig {
        cache: true,
        ..ImageColorsConfig::default()
    };

    let first = service.get_colors(&url, Some(&options)).await.expect("first call");
    let second = service.get_colors(&url, Some(&options)).await.expect("cached call");

    assert_eq!(first, second);
    assert_eq!(service.cached_len().expect("len"), 1);
}

#[tokio::test]
async fn invalid_fallback_is_rejected_before_loading() {
    let options = ImageColorsConfig {
        fallback: Some("#12345".to_string()),
        ..ImageColorsConfig::default()
    };

    // 无服务监听的地址：若先做 I/O 将得到网络错误而不是配置错误
    let err = handler()
        .get_colors("http://127.0.0.1:9/never.png", Some(&options))
        .await
        .expect_err("invalid fallback must fail");

    assert_eq!(err.code(), "E_INVALID_CONFIG");
    assert_eq!(err.stage(), "config");
}

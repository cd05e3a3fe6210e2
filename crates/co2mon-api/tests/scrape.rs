//! Scrape endpoint tests.
//!
//! Drives real bindings from a scripted transport through the sampler and
//! checks what a scraper sees on `/metrics`.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use co2mon_api::build_router;
use co2mon_core::{Reading, SensorIdentity};
use co2mon_device::{DeviceError, FakeTransport};
use co2mon_metrics::bind_sensors;

async fn scrape(router: axum::Router) -> String {
    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn sample_line(body: &str, name: &str) -> Option<String> {
    body.lines()
        .find(|l| l.split_once(' ').is_some_and(|(n, _)| n == name))
        .map(|l| l.to_string())
}

#[tokio::test]
async fn two_sensors_after_first_cycle() {
    let transport = FakeTransport::new()
        .with_sensor("/dev/hid0", vec![Ok(Reading::new(21.5, 650))])
        .with_sensor("/dev/hid1", vec![Ok(Reading::new(22.0, 700))]);
    let (set, mut sampler) = bind_sensors(&transport).unwrap();
    sampler.run_cycle().unwrap();

    let body = scrape(build_router(set)).await;

    let hid0 = SensorIdentity::from_path("/dev/hid0").to_hex();
    let hid1 = SensorIdentity::from_path("/dev/hid1").to_hex();
    assert_ne!(hid0, hid1);

    assert_eq!(
        sample_line(&body, &format!("meter_{hid0}_temperature_celsius")).unwrap(),
        format!("meter_{hid0}_temperature_celsius 21.5")
    );
    assert_eq!(
        sample_line(&body, &format!("meter_{hid0}_co2_ppm")).unwrap(),
        format!("meter_{hid0}_co2_ppm 650")
    );
    assert_eq!(
        sample_line(&body, &format!("meter_{hid1}_temperature_celsius")).unwrap(),
        format!("meter_{hid1}_temperature_celsius 22")
    );
    assert_eq!(
        sample_line(&body, &format!("meter_{hid1}_co2_ppm")).unwrap(),
        format!("meter_{hid1}_co2_ppm 700")
    );
}

#[tokio::test]
async fn no_sensors_serves_empty_exposition() {
    let (set, _sampler) = bind_sensors(&FakeTransport::new()).unwrap();
    let body = scrape(build_router(set)).await;
    assert!(body.is_empty());
}

#[tokio::test]
async fn bound_but_unread_sensor_has_no_samples() {
    let transport = FakeTransport::new().with_sensor("/dev/hid0", vec![]);
    let (set, _sampler) = bind_sensors(&transport).unwrap();

    let body = scrape(build_router(set)).await;
    let hex = SensorIdentity::from_path("/dev/hid0").to_hex();
    assert!(body.contains(&format!("# TYPE meter_{hex}_co2_ppm gauge")));
    assert!(sample_line(&body, &format!("meter_{hex}_co2_ppm")).is_none());
}

#[tokio::test]
async fn read_failure_freezes_values_for_every_sensor() {
    let transport = FakeTransport::new()
        .with_sensor(
            "/dev/hid0",
            vec![Ok(Reading::new(21.5, 650)), Ok(Reading::new(25.0, 900))],
        )
        .with_sensor(
            "/dev/hid1",
            vec![Ok(Reading::new(22.0, 700)), Err(DeviceError::Disconnected)],
        );
    let (set, sampler) = bind_sensors(&transport).unwrap();
    let router = build_router(set);

    let failure = sampler.spawn().unwrap().await.unwrap();
    assert_eq!(failure.path, "/dev/hid1");

    // hid0 was read twice before hid1 failed; nothing runs after that.
    let body = scrape(router.clone()).await;
    let hid0 = SensorIdentity::from_path("/dev/hid0").to_hex();
    let hid1 = SensorIdentity::from_path("/dev/hid1").to_hex();
    assert!(body.contains(&format!("meter_{hid0}_co2_ppm 900\n")));
    assert!(body.contains(&format!("meter_{hid1}_co2_ppm 700\n")));
    assert_eq!(transport.read_count("/dev/hid0"), 2);
    assert_eq!(transport.read_count("/dev/hid1"), 2);

    assert_eq!(scrape(router).await, body);
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let (set, _sampler) = bind_sensors(&FakeTransport::new()).unwrap();
    let req = Request::builder()
        .uri("/metrics/extra")
        .body(Body::empty())
        .unwrap();

    let resp = build_router(set).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

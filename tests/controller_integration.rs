// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for device discovery and commands using wiremock.

use serde_json::json;
use vera_lib::device::service;
use vera_lib::{
    Brightness, DeviceId, DeviceKind, Error, HttpConfig, HvacMode, VeraController, VeraDevice,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Fixtures
// ============================================================================

fn sdata() -> serde_json::Value {
    json!({
        "model": "fake_model_number",
        "version": "1.7.4453",
        "serial_number": "fake_serial_number",
        "temperature": "F",
        "categories": [
            {"id": 2, "name": "Dimmable Light"},
            {"id": 3, "name": "On/Off Switch"},
            {"id": 4, "name": "Sensor"},
            {"id": 5, "name": "Thermostat"},
            {"id": 7, "name": "Door lock"},
            {"id": 17, "name": "Temperature Sensor"}
        ],
        "devices": [
            {"id": 1, "name": "Kitchen", "category": 2, "status": "0", "level": "0", "room": 1},
            {"id": 3, "name": "Lamp", "category": 3, "status": "0", "room": 1},
            {"id": 4, "name": "Hall motion", "category": 4, "armed": "0", "tripped": "0", "batterylevel": "90"},
            {"id": 5, "name": "Heater", "category": 5, "mode": "Off", "fanmode": "Auto", "setpoint": "20", "temperature": "18.5"},
            {"id": 7, "name": "Front door", "category": 7, "locked": "1"},
            {"id": 17, "category": 17, "temperature": "21.5"},
            {"id": 99, "name": "Mystery", "category": 99}
        ],
        "scenes": [
            {"id": 101, "name": "Evening", "active": 0, "room": 1}
        ]
    })
}

fn status() -> serde_json::Value {
    json!({
        "devices": [
            {"id": 1, "states": [
                {"service": "urn:micasaverde-com:serviceId:Color1", "variable": "CurrentColor", "value": "I=0,A=0,R=255,G=100,B=100"}
            ]},
            {"id": 3, "states": []},
            {"id": 4, "states": []},
            {"id": 5, "states": []},
            {"id": 7, "states": [
                {"service": "urn:micasaverde-com:serviceId:DoorLock1", "variable": "sl_UserCode", "value": "UserID=\"3\" UserName=\"John\""}
            ]},
            {"id": 17, "states": []},
            {"id": 99},
            {"id": 123, "states": []}
        ]
    })
}

async fn hub() -> (MockServer, VeraController) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data_request"))
        .and(query_param("id", "sdata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sdata()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data_request"))
        .and(query_param("id", "status"))
        .and(query_param("output_format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status()))
        .mount(&server)
        .await;

    let controller = VeraController::new(HttpConfig::from_url(&server.uri()).unwrap()).unwrap();
    (server, controller)
}

async fn by_id(controller: &VeraController, id: u32) -> VeraDevice {
    controller.get_device_by_id(DeviceId::new(id)).await.unwrap()
}

fn lu_action(device: u32, service_id: &str, action: &str) -> wiremock::MockBuilder {
    Mock::given(method("GET"))
        .and(path("/data_request"))
        .and(query_param("id", "lu_action"))
        .and(query_param("output_format", "json"))
        .and(query_param("DeviceNum", device.to_string()))
        .and(query_param("serviceId", service_id))
        .and(query_param("action", action))
}

// ============================================================================
// Discovery
// ============================================================================

mod discovery {
    use super::*;

    #[tokio::test]
    async fn refresh_data_reads_hub_metadata() {
        let (_server, controller) = hub().await;

        let devices = controller.refresh_data().await.unwrap();

        assert_eq!(controller.model().as_deref(), Some("fake_model_number"));
        assert_eq!(controller.version().as_deref(), Some("1.7.4453"));
        assert_eq!(controller.serial_number().as_deref(), Some("fake_serial_number"));
        assert_eq!(controller.temperature_units(), "F");
        assert_eq!(devices.len(), 7);
        assert_eq!(
            devices[&DeviceId::new(3)].get("categoryName"),
            Some(&json!("On/Off Switch"))
        );
        assert!(!devices[&DeviceId::new(99)].contains_key("categoryName"));
    }

    #[tokio::test]
    async fn devices_are_categorised() {
        let (_server, controller) = hub().await;

        let devices = controller.get_devices().await.unwrap();
        let kinds: Vec<(u32, DeviceKind)> = devices
            .iter()
            .map(|device| (device.id().value(), device.kind()))
            .collect();

        assert_eq!(
            kinds,
            vec![
                (1, DeviceKind::Dimmer),
                (3, DeviceKind::Switch),
                (4, DeviceKind::BinarySensor),
                (4, DeviceKind::ArmableSensor),
                (5, DeviceKind::Thermostat),
                (7, DeviceKind::Lock),
                (17, DeviceKind::Sensor),
                (99, DeviceKind::Generic),
                (123, DeviceKind::Generic),
            ]
        );

        let unnamed = by_id(&controller, 17).await;
        assert_eq!(unnamed.name(), "Vera Temperature Sensor 17");
        assert_eq!(unnamed.temperature(), Some(21.5));
        assert_eq!(by_id(&controller, 123).await.name(), "Vera Device 123");
    }

    #[tokio::test]
    async fn device_list_is_cached() {
        let (server, controller) = hub().await;

        let first = controller.get_devices().await.unwrap();
        let second = controller.get_devices().await.unwrap();
        assert_eq!(first, second);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
    }

    #[tokio::test]
    async fn filters_and_lookups() {
        let (_server, controller) = hub().await;

        let sensors = controller
            .get_devices_of_kind(&[DeviceKind::BinarySensor, DeviceKind::ArmableSensor])
            .await
            .unwrap();
        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors[0].id(), sensors[1].id());

        assert_eq!(controller.get_devices_of_kind(&[]).await.unwrap().len(), 9);

        let lamp = controller.get_device_by_name("Lamp").await.unwrap().unwrap();
        assert_eq!(lamp.id(), DeviceId::new(3));
        assert!(controller.get_device_by_name("Nope").await.unwrap().is_none());

        let err = controller.get_device_by_id(DeviceId::new(2)).await.unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound(id) if id == DeviceId::new(2)));
    }

    #[tokio::test]
    async fn scenes_are_listed() {
        let (_server, controller) = hub().await;

        let scenes = controller.get_scenes().await.unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].id(), 101);
        assert_eq!(scenes[0].name(), "Evening");
        assert!(!scenes[0].is_active());
    }

    #[tokio::test]
    async fn non_object_sdata_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("id", "sdata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
            .mount(&server)
            .await;
        let controller = VeraController::new(HttpConfig::from_url(&server.uri()).unwrap()).unwrap();

        let err = controller.get_devices().await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test]
    async fn switch_on_sets_target_and_cache() {
        let (server, controller) = hub().await;
        lu_action(3, service::SWITCH_POWER, "SetTarget")
            .and(query_param("newTargetValue", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&server)
            .await;

        let lamp = by_id(&controller, 3).await;
        assert!(!lamp.is_switched_on());
        lamp.switch_on().await.unwrap();
        assert!(lamp.is_switched_on());
    }

    #[tokio::test]
    async fn dimmer_brightness_uses_percentage() {
        let (server, controller) = hub().await;
        lu_action(1, service::DIMMING, "SetLoadLevelTarget")
            .and(query_param("newLoadlevelTarget", "50"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let light = by_id(&controller, 1).await;
        light.set_brightness(Brightness::new(128)).await.unwrap();
        assert_eq!(light.get_str("level").as_deref(), Some("50"));
        assert!(light.is_switched_on());

        let color = light.get_color().unwrap();
        assert_eq!((color.red(), color.green(), color.blue()), (255, 100, 100));
    }

    #[tokio::test]
    async fn arming_goes_through_the_armable_view() {
        let (server, controller) = hub().await;
        lu_action(4, service::SECURITY_SENSOR, "SetArmed")
            .and(query_param("newArmedValue", "1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let views = controller
            .get_devices_of_kind(&[DeviceKind::BinarySensor, DeviceKind::ArmableSensor])
            .await
            .unwrap();
        let (sensor, armable) = (&views[0], &views[1]);

        armable.switch_on().await.unwrap();
        assert!(armable.is_armed());
        assert!(sensor.is_armed());
        assert_eq!(sensor.battery_level(), Some(90));
    }

    #[tokio::test]
    async fn thermostat_mode_and_setpoint() {
        let (server, controller) = hub().await;
        lu_action(5, service::HVAC_OPERATING_MODE, "SetModeTarget")
            .and(query_param("NewModeTarget", "HeatOn"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        lu_action(5, service::TEMPERATURE_SETPOINT, "SetCurrentSetpoint")
            .and(query_param("NewCurrentSetpoint", "22.5"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let heater = by_id(&controller, 5).await;
        assert_eq!(heater.get_hvac_mode(), Some(HvacMode::Off));
        assert_eq!(heater.get_current_temperature(), Some(18.5));

        heater.turn_heat_on().await.unwrap();
        heater.set_temperature(22.5).await.unwrap();

        assert_eq!(heater.get_hvac_mode(), Some(HvacMode::HeatOn));
        assert_eq!(heater.get_current_goal_temperature(), Some(22.5));
    }

    #[tokio::test]
    async fn lock_commands_and_user_code() {
        let (server, controller) = hub().await;
        lu_action(7, service::DOOR_LOCK, "SetTarget")
            .and(query_param("newTargetValue", "0"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let lock = by_id(&controller, 7).await;
        assert!(lock.is_locked());
        lock.unlock().await.unwrap();
        assert!(!lock.is_locked());

        let user = lock.get_last_user().unwrap();
        assert_eq!(user.id, "3");
        assert_eq!(user.name, "John");
    }

    #[tokio::test]
    async fn unsupported_command_sends_nothing() {
        let (server, controller) = hub().await;
        Mock::given(method("GET"))
            .and(query_param("id", "lu_action"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let lamp = by_id(&controller, 3).await;
        let err = lamp.lock().await.unwrap_err();
        assert!(matches!(err, Error::Device(_)));
        assert!(lamp.set_brightness(Brightness::MAX).await.is_err());
    }

    #[tokio::test]
    async fn failed_command_leaves_cache_alone() {
        let (server, controller) = hub().await;
        lu_action(3, service::SWITCH_POWER, "SetTarget")
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let lamp = by_id(&controller, 3).await;
        let err = lamp.switch_on().await.unwrap_err();
        assert!(err.is_protocol());
        assert!(!lamp.is_switched_on());
    }

    #[tokio::test]
    async fn scene_activation() {
        let (server, controller) = hub().await;
        Mock::given(method("GET"))
            .and(query_param("id", "lu_action"))
            .and(query_param("serviceId", service::HOME_AUTOMATION_GATEWAY))
            .and(query_param("action", "RunScene"))
            .and(query_param("SceneNum", "101"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let scene = controller.get_scenes().await.unwrap().remove(0);
        scene.activate().await.unwrap();
        assert!(scene.is_active());
    }

    #[tokio::test]
    async fn refresh_complex_value_reads_variableget() {
        let (server, controller) = hub().await;
        Mock::given(method("GET"))
            .and(query_param("id", "variableget"))
            .and(query_param("DeviceNum", "7"))
            .and(query_param("serviceId", service::DOOR_LOCK))
            .and(query_param("Variable", "sl_UserCode"))
            .respond_with(ResponseTemplate::new(200).set_body_string("UserID=\"4\" UserName=\"Ann\""))
            .mount(&server)
            .await;

        let lock = by_id(&controller, 7).await;
        let value = lock.refresh_complex_value("sl_UserCode").await.unwrap();
        assert_eq!(value, "UserID=\"4\" UserName=\"Ann\"");
        assert_eq!(lock.get_last_user().unwrap().name, "Ann");

        assert!(lock.refresh_complex_value("sl_Missing").await.is_err());
    }
}

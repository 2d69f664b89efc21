fn main() {
    println!("cargo:rerun-if-env-changed=TRAFFICCTL_CONFIG_JSON");
    println!("cargo:rerun-if-env-changed=TRAFFICCTL_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=TRAFFICCTL_WIFI_PASS");
    println!("cargo:rerun-if-env-changed=TRAFFICCTL_MQTT_URL");
    println!("cargo:rerun-if-env-changed=TRAFFICCTL_MQTT_USER");
    println!("cargo:rerun-if-env-changed=TRAFFICCTL_MQTT_PASS");

    // Only the firmware build needs the ESP-IDF environment; host builds
    // (tests, fuzzing) skip it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}

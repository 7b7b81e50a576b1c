//! Injected-script builders
//!
//! Native code pushes state into the embedded script environment by
//! evaluating small generated scripts: platform markers once per successful
//! page load, and the device-info global after each `getDeviceInfo` request.
//! Every injection is a one-shot write with no native-side cache; repeating
//! one is harmless.

use crate::{BridgeError, DeviceInfoSnapshot, DEVICE_INFO_GLOBAL};

/// Script that writes the device-info snapshot into the script global
/// namespace under [`DEVICE_INFO_GLOBAL`].
pub fn device_info_script(snapshot: &DeviceInfoSnapshot) -> Result<String, BridgeError> {
    let json = serde_json::to_string(snapshot).map_err(|e| BridgeError::inject(e.to_string()))?;
    Ok(format!("window.{DEVICE_INFO_GLOBAL} = {json};"))
}

/// Script that marks the hosting platform for the embedded app: a boolean
/// `IS_<PLATFORM>` flag plus the `PLATFORM` identifier string. Injected once
/// per successful page load.
///
/// The identifier is reduced to lowercase alphanumerics so it is always safe
/// to splice into a script literal; an identifier that sanitizes to nothing
/// falls back to `ios`.
pub fn platform_marker_script(platform_id: &str) -> String {
    let mut id: String = platform_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if id.is_empty() {
        id.push_str("ios");
    }

    format!(
        "window.IS_{flag} = true;\nwindow.PLATFORM = '{id}';\nconsole.log('{id} bridge initialized');",
        flag = id.to_ascii_uppercase(),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_info_script_is_an_assignment() {
        let snapshot = DeviceInfoSnapshot {
            platform: "ios".to_string(),
            version: "17.4".to_string(),
            model: "iPhone".to_string(),
            name: "Dev \"Phone\"".to_string(),
        };
        let script = device_info_script(&snapshot).unwrap();
        assert!(script.starts_with("window.iOSDeviceInfo = {"));
        assert!(script.ends_with(';'));
        // Quotes in device names stay inside the JSON literal.
        assert!(script.contains(r#"\"Phone\""#));
    }

    #[test]
    fn platform_markers_for_ios() {
        let script = platform_marker_script("ios");
        assert!(script.contains("window.IS_IOS = true;"));
        assert!(script.contains("window.PLATFORM = 'ios';"));
    }

    #[test]
    fn platform_id_is_sanitized() {
        let script = platform_marker_script("i os'; alert(1);//");
        assert!(script.contains("window.PLATFORM = 'iosalert1';"));
    }

    #[test]
    fn degenerate_platform_id_falls_back() {
        for id in ["", "'; //", "---"] {
            let script = platform_marker_script(id);
            assert!(script.contains("window.IS_IOS = true;"), "id: {id:?}");
            assert!(script.contains("window.PLATFORM = 'ios';"), "id: {id:?}");
        }
    }
}

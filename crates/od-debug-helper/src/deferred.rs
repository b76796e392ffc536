//! Deferred INP annotation.
//!
//! INP observations are keyed by the interaction-target selector web-vitals
//! reports, which only the browser can resolve. Rather than matching on the
//! server, the page gets one module script carrying the observations; after
//! the load event it imports the client module and lets it place markers.

use od_debug_core::{InpObservations, encode_observations};

use crate::error::Result;

/// `id` of the emitted script element.
pub const SCRIPT_ID: &str = "od-debug-inp-annotations";

/// Keeps embedded text from closing the script element or opening a
/// comment inside it. The result is read as a JavaScript literal, not
/// passed to `JSON.parse`.
fn escape_script_text(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}

/// Builds the module script that annotates INP targets after load.
pub fn annotation_script(observations: &InpObservations, client_module_url: &str) -> Result<String> {
    let data = escape_script_text(&encode_observations(observations)?);
    let module_url = escape_script_text(&serde_json::to_string(client_module_url)?);
    Ok(format!(
        r#"<script type="module" id="{SCRIPT_ID}">
import init, {{ annotateInp }} from {module_url};
const inpData = {data};
const run = async () => {{
  await init();
  annotateInp(inpData);
}};
if (document.readyState === "complete") {{
  run();
}} else {{
  window.addEventListener("load", run, {{ once: true }});
}}
</script>"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use od_debug_core::{InpObservation, Rating};

    fn observations(locator: &str) -> InpObservations {
        let mut observations = InpObservations::new();
        observations.insert(
            locator.to_string(),
            vec![InpObservation {
                value: 120.0,
                rating: Rating::Good,
            }],
        );
        observations
    }

    #[test]
    fn embeds_observations_and_module_url() {
        let script = annotation_script(&observations("#cta"), "/od-debug-client.js").unwrap();
        assert!(script.starts_with("<script type=\"module\" id=\"od-debug-inp-annotations\">"));
        assert!(script.contains(r#"from "/od-debug-client.js";"#));
        assert!(script.contains(r##"const inpData = {"#cta":[{"value":120.0,"rating":"good"}]};"##));
        assert!(script.contains("annotateInp(inpData)"));
        assert!(script.ends_with("</script>"));
    }

    #[test]
    fn cannot_close_its_own_script_element() {
        let script =
            annotation_script(&observations("a[title=\"</script>\"]"), "/x.js").unwrap();
        assert_eq!(script.matches("</script>").count(), 1);
        assert!(script.contains("<\\/script>"));
    }
}

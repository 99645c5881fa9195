use crate::{
    error::{BedrockError, ResponseDefect, Result},
    models::{GeneratedImage, ModelFamily, StabilityImageResponse, TitanImageResponse},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde_json::Value;

const STABILITY_FILTERED: &str = "CONTENT_FILTERED";
const STABILITY_ERROR: &str = "ERROR";

fn malformed(defect: ResponseDefect) -> BedrockError {
    BedrockError::MalformedResponse(defect)
}

fn parse_shape<T: DeserializeOwned>(value: Value, family: ModelFamily) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        malformed(ResponseDefect::UnexpectedShape(format!(
            "not a {} image response: {}",
            family, e
        )))
    })
}

/// Locate and decode the single generated image in a family's response body.
pub fn decode_response(family: ModelFamily, body: &[u8]) -> Result<GeneratedImage> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| malformed(ResponseDefect::NotJson(e.to_string())))?;

    let base64 = match family {
        ModelFamily::Stability => {
            let response: StabilityImageResponse = parse_shape(value, family)?;
            let artifact = response
                .artifacts
                .into_iter()
                .next()
                .ok_or_else(|| malformed(ResponseDefect::NoImage))?;

            match artifact.finish_reason.as_deref() {
                Some(STABILITY_FILTERED) => {
                    return Err(malformed(ResponseDefect::ContentFiltered(
                        "the image was blocked by the content filter".into(),
                    )))
                }
                Some(STABILITY_ERROR) => {
                    return Err(malformed(ResponseDefect::UnexpectedShape(
                        "artifact finished with ERROR".into(),
                    )))
                }
                _ => {}
            }
            if let Some(seed) = artifact.seed {
                log::debug!("Stability artifact seed: {}", seed);
            }
            artifact.base64
        }
        ModelFamily::Titan => {
            let response: TitanImageResponse = parse_shape(value, family)?;
            if let Some(error) = response.error.filter(|e| !e.is_empty()) {
                return Err(malformed(ResponseDefect::ContentFiltered(error)));
            }
            response
                .images
                .into_iter()
                .next()
                .ok_or_else(|| malformed(ResponseDefect::NoImage))?
        }
    };

    if base64.is_empty() {
        return Err(malformed(ResponseDefect::NoImage));
    }

    let bytes = STANDARD
        .decode(base64.as_bytes())
        .map_err(|e| malformed(ResponseDefect::InvalidBase64(e.to_string())))?;

    Ok(GeneratedImage { base64, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bedrock::payload::build_payload;
    use crate::models::{GenerationRequest, ImageModel};
    use serde_json::json;

    const PIXEL: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

    fn stability_body(b64: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "result": "success",
            "artifacts": [{ "seed": 7, "base64": b64, "finishReason": "SUCCESS" }]
        }))
        .unwrap()
    }

    fn titan_body(b64: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({ "images": [b64], "error": null })).unwrap()
    }

    #[test]
    fn every_family_round_trips_its_base64_unchanged() {
        let encoded = STANDARD.encode(PIXEL);
        for model in ImageModel::ALL {
            let request = GenerationRequest::for_model(model, "round trip");
            build_payload(&request).unwrap();
            let body = match model.family() {
                ModelFamily::Stability => stability_body(&encoded),
                ModelFamily::Titan => titan_body(&encoded),
            };
            let image = decode_response(model.family(), &body).unwrap();
            assert_eq!(image.base64, encoded);
            assert_eq!(image.bytes, PIXEL);
        }
    }

    #[test]
    fn empty_lists_mean_no_image() {
        let err = decode_response(ModelFamily::Titan, br#"{"images": []}"#).unwrap_err();
        assert!(matches!(
            err,
            BedrockError::MalformedResponse(ResponseDefect::NoImage)
        ));

        let err = decode_response(ModelFamily::Stability, br#"{"artifacts": []}"#).unwrap_err();
        assert!(matches!(
            err,
            BedrockError::MalformedResponse(ResponseDefect::NoImage)
        ));
    }

    #[test]
    fn non_json_is_rejected_strictly() {
        // a python-literal style body must not be accepted
        let err = decode_response(ModelFamily::Titan, b"{'images': ['abc']}").unwrap_err();
        assert!(matches!(
            err,
            BedrockError::MalformedResponse(ResponseDefect::NotJson(_))
        ));
    }

    #[test]
    fn wrong_family_shape_is_rejected() {
        let err =
            decode_response(ModelFamily::Stability, &titan_body(&STANDARD.encode(PIXEL))).unwrap_err();
        assert!(matches!(
            err,
            BedrockError::MalformedResponse(ResponseDefect::UnexpectedShape(_))
        ));
    }

    #[test]
    fn filtered_and_broken_images_are_reported() {
        let body = json!({ "artifacts": [{ "base64": "", "finishReason": "CONTENT_FILTERED" }] });
        let err = decode_response(ModelFamily::Stability, &serde_json::to_vec(&body).unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            BedrockError::MalformedResponse(ResponseDefect::ContentFiltered(_))
        ));

        let body = json!({ "images": [], "error": "blocked by content filters" });
        let err =
            decode_response(ModelFamily::Titan, &serde_json::to_vec(&body).unwrap()).unwrap_err();
        assert!(err.to_string().contains("blocked by content filters"));

        let err = decode_response(ModelFamily::Titan, &titan_body("%%%not base64%%%")).unwrap_err();
        assert!(matches!(
            err,
            BedrockError::MalformedResponse(ResponseDefect::InvalidBase64(_))
        ));
    }
}

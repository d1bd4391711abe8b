//! Content payloads for the change-description service.
//!
//! The service receives one user message whose content is the prompt followed
//! by every cropped region as an inline PNG data URL. Its reply is attached to
//! a [`ChangeSet`](crate::ChangeSet) verbatim.

use serde::{Deserialize, Serialize};

use crate::crop::CroppedRegion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One element of a chat message's `content` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn png_base64(payload: &str) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:image/png;base64,{payload}"),
            },
        }
    }
}

/// Prompt first, then one image part per crop in crop order.
pub fn prepare_content(prompt: &str, crops: &[CroppedRegion]) -> Vec<ContentPart> {
    let mut content = Vec::with_capacity(crops.len() + 1);
    content.push(ContentPart::Text {
        text: prompt.to_string(),
    });
    content.extend(crops.iter().map(|c| ContentPart::png_base64(&c.png_base64)));
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Region;

    #[test]
    fn test_prepare_content_order() {
        let crops: Vec<CroppedRegion> = (0..2)
            .map(|i| CroppedRegion {
                source_index: i,
                region: Region::from_bounds(0, 0, 1, 1),
                png_base64: format!("AAA{i}"),
            })
            .collect();
        let content = prepare_content("What changed?", &crops);
        assert_eq!(content.len(), 3);
        assert_eq!(
            content[0],
            ContentPart::Text {
                text: "What changed?".to_string()
            }
        );
        assert_eq!(content[2], ContentPart::png_base64("AAA1"));
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(ContentPart::png_base64("Zm9v")).unwrap();
        assert_eq!(json["type"], "image_url");
        assert_eq!(json["image_url"]["url"], "data:image/png;base64,Zm9v");
    }
}

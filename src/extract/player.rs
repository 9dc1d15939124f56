use serde::Deserialize;

const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse";

/// The parts of the embedded player response we read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub captions: Option<Captions>,
    pub video_details: Option<VideoDetails>,
    pub microformat: Option<Microformat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Captions {
    pub player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracklistRenderer {
    #[serde(default)]
    pub caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub title: Option<String>,
    pub author: Option<String>,
    pub length_seconds: Option<String>,
    pub short_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Microformat {
    pub player_microformat_renderer: Option<MicroformatRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroformatRenderer {
    pub title: Option<SimpleText>,
    pub description: Option<SimpleText>,
    pub owner_channel_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleText {
    pub simple_text: Option<String>,
}

fn non_empty(s: Option<&String>) -> Option<&str> {
    s.map(|s| s.as_str()).filter(|s| !s.trim().is_empty())
}

impl PlayerResponse {
    fn renderer(&self) -> Option<&MicroformatRenderer> {
        self.microformat
            .as_ref()
            .and_then(|m| m.player_microformat_renderer.as_ref())
    }

    pub fn first_caption_url(&self) -> Option<&str> {
        self.captions
            .as_ref()?
            .player_captions_tracklist_renderer
            .as_ref()?
            .caption_tracks
            .first()?
            .base_url
            .as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        non_empty(self.video_details.as_ref().and_then(|d| d.title.as_ref())).or_else(|| {
            non_empty(
                self.renderer()
                    .and_then(|r| r.title.as_ref())
                    .and_then(|t| t.simple_text.as_ref()),
            )
        })
    }

    pub fn author(&self) -> Option<&str> {
        non_empty(self.video_details.as_ref().and_then(|d| d.author.as_ref()))
            .or_else(|| non_empty(self.renderer().and_then(|r| r.owner_channel_name.as_ref())))
    }

    pub fn length_seconds(&self) -> Option<&str> {
        non_empty(
            self.video_details
                .as_ref()
                .and_then(|d| d.length_seconds.as_ref()),
        )
    }

    pub fn description(&self) -> Option<&str> {
        non_empty(
            self.video_details
                .as_ref()
                .and_then(|d| d.short_description.as_ref()),
        )
        .or_else(|| {
            non_empty(
                self.renderer()
                    .and_then(|r| r.description.as_ref())
                    .and_then(|t| t.simple_text.as_ref()),
            )
        })
    }
}

/// Locate the player response assigned in an inline script.
///
/// Every occurrence of the marker is tried in turn; an occurrence whose
/// assigned object does not balance or does not parse is skipped.
pub fn find_player_response(html: &str) -> Option<PlayerResponse> {
    let mut from = 0;
    while let Some(pos) = html[from..].find(PLAYER_RESPONSE_MARKER) {
        let after_marker = from + pos + PLAYER_RESPONSE_MARKER.len();
        from = after_marker;

        let Some(object) = assigned_object(&html[after_marker..]) else {
            continue;
        };
        match serde_json::from_str::<PlayerResponse>(object) {
            Ok(parsed) => return Some(parsed),
            Err(e) => tracing::debug!("Skipping unparsable player response: {}", e),
        }
    }
    None
}

/// The `{...}` literal following the next `=`, if it balances.
fn assigned_object(rest: &str) -> Option<&str> {
    let eq = rest.find('=')?;
    let value = rest[eq + 1..].trim_start();
    if !value.starts_with('{') {
        return None;
    }
    let end = balanced_object_end(value)?;
    Some(&value[..end])
}

/// Byte length of the object starting at `s[0] == '{'`, honouring strings.
fn balanced_object_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

use crate::types::{Destination, EditContext};

const DEFAULT_ANIMATION: &str = "subtle natural motion, the person smiles and looks around";

/// Maps the edit context and the user's text to the prompt sent with the photo
pub fn build_prompt(context: EditContext, destination: Destination, free_text: &str) -> String {
    let text = free_text.trim();
    match context {
        EditContext::Clothes => format!(
            "Change the clothes of the person in this photo to: {text}. \
             Keep their face, pose, body shape and the background exactly the same."
        ),
        EditContext::Celebrity => format!(
            "Add {text} standing next to the person in this photo, as if they posed together. \
             Match the lighting, perspective and photo quality so it looks like a real photo."
        ),
        EditContext::Background => format!(
            "Replace the background of this photo with: {text}. \
             Keep the person in the foreground unchanged and blend the edges naturally."
        ),
        EditContext::Destination => {
            let mut prompt = format!(
                "Place the person from this photo {}. \
                 Keep their face and clothes unchanged and make it look like a real travel photo.",
                destination.scene()
            );
            if !text.is_empty() {
                prompt.push_str(&format!(" Style: {text}."));
            }
            prompt
        }
    }
}

/// Prompt for animating the uploaded photo into a short clip
pub fn build_video_prompt(free_text: &str) -> String {
    let text = free_text.trim();
    let motion = if text.is_empty() { DEFAULT_ANIMATION } else { text };
    format!(
        "Animate this photo into a short, realistic video clip: {motion}. \
         Keep the person's identity and the scene consistent."
    )
}

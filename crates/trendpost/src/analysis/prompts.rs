//! Prompt template management.

use anyhow::Result;
use handlebars::Handlebars;
use serde::Serialize;

/// Name of the embedded trend selection template.
pub const SELECTION_TEMPLATE_NAME: &str = "selection";

/// Manages Handlebars prompt templates.
pub struct PromptManager {
    handlebars: Handlebars<'static>,
}

impl PromptManager {
    /// Create a new prompt manager with embedded templates.
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        // Prompts are plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars.register_template_string(SELECTION_TEMPLATE_NAME, SELECTION_TEMPLATE)?;

        Ok(Self { handlebars })
    }

    /// Render a registered template with the given data.
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        let result = self.handlebars.render(template, data)?;
        Ok(result)
    }

    /// Render an ad-hoc template string (user-supplied content prompts).
    pub fn render_str<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        let result = self.handlebars.render_template(template, data)?;
        Ok(result)
    }
}

/// Trend selection prompt.
const SELECTION_TEMPLATE: &str = r#"Given these trending topics:
{{trends}}

And this meme token information:
Token Name: {{token_name}}
Token Description: {{token_description}}

1. Select the single most suitable trending topic for creating a viral meme tweet. Copy it exactly as written in the list above.
2. Explain why this trend is the best choice in 2-3 sentences.

Format your response as JSON with two fields:
{
    "selected_trend": "the selected trend",
    "explanation": "your explanation"
}
"#;

/// Default content prompt. Placeholders: `token_name`, `token_description`,
/// `selected_trend`, `context_info`, `context`.
pub const DEFAULT_CONTENT_TEMPLATE: &str = r#"
Creative Meme Coin Content Creator
Turn your meme coin into the next viral sensation! Let's create engaging content that captures the community's attention.

First, analyze all the trending topics and select the most suitable one for the meme coin by considering:
1. Relevance to crypto/blockchain/technology
2. Potential for creative connection with the token's theme
3. Current popularity and engagement potential

Selected trend: {{selected_trend}}

Content Generation Parameters
{{context_info}}
Token Details

Name: {{token_name}}
Description: {{token_description}}

Content Style Guide

Language: English/Chinese (as specified)
Tone: Casual, clever, community-focused
Format: Optimized for Twitter
Elements: Text + Emojis + Hashtags

Content Strategy

Engaging Hook
- Attention-grabbing opener
- Relate to current trends
- Use compelling language

Core Message
- Highlight unique features
- Connect with community
- Include meme references

Viral Elements
- Strategic emoji placement
- Trending hashtag integration
- Call-to-action

Community Focus
- Foster engagement
- Encourage sharing
- Build connections

Output Format
Tweet format should follow:
[Hook] + [Core Message] + [Community Element] + [Call to Action] + [Trending Tags]

Content Requirements
- Keep it fun and shareable
- Blend humor with value
- Stay relevant to trends
- Encourage interaction
- Maintain brand voice

Ready to create your next viral tweet! 🚀

Note: Each piece of content will be uniquely crafted based on the provided parameters while maintaining optimal engagement potential.
Using the above guidelines and context, create a creative and engaging tweet for the meme coin "{{token_name}}" based on its description: "{{token_description}}". Ensure that the tweet content is strongly related to the selected trending hashtag to maximize engagement.
"#;

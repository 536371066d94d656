// brandforge: Brand block rendering and system prompt assembly
//
// Rendering is a pure function of one profile snapshot. The output carries no
// timestamps or ids beyond what the profile holds, so an unchanged profile
// produces the same prompt on every chat turn.

use crate::branding::BrandingProfile;

/// Heading of the logo instructions used when a stored logo is referenced.
pub const EXISTING_LOGO_MARKER: &str = "USE THE STORED BRAND LOGO";

/// Heading of the logo instructions used when a logo has to be drawn.
pub const SYNTHESIZE_LOGO_MARKER: &str = "GENERATE A PLACEHOLDER LOGO";

/// Base prompt used when no base prompt file is configured.
pub const DEFAULT_BASE_PROMPT: &str = "You are an expert AI assistant and senior software developer. \
You build complete, working websites and applications, and you apply the user's brand \
identity to everything you generate.

For all websites and UIs you generate, apply the brand style guide from the \
<brand_style_guide> section when one is present: exact brand colors for every UI element, \
the brand font for all text, and the brand logo where a logo belongs. If no brand style \
guide is provided, use clean, modern design principles with a focus on usability.";

const DESIGN_PRINCIPLES: &str = "DESIGN PRINCIPLES:
  - Use the primary color for main UI elements, buttons, and headings
  - Use the secondary color for supporting elements and backgrounds
  - Use the accent color sparingly for call-to-action elements or highlights
  - Apply the specified font family to all text elements
  - Maintain consistent spacing and layout throughout the application
  - Ensure high contrast between text and background colors for readability";

const ADHERENCE_DIRECTIVE: &str = "ULTRA IMPORTANT: Every website, application, or UI element MUST STRICTLY adhere to the brand style guide. This means:
  - Using the exact colors specified for backgrounds, text, buttons, and UI elements.
  - Applying the given typography for all text (headings, paragraphs, buttons, etc.).
  - Respecting the layout, spacing, and design principles provided.
  - Never substituting or ignoring any element of the branding.

Failure to apply these rules is not acceptable. All output must follow the defined brand identity without exception.";

/// Render the brand style guide for `profile`, or an empty string when custom
/// branding is off.
pub fn render_brand_block(profile: &BrandingProfile) -> String {
    if !profile.is_custom_branding_enabled {
        return String::new();
    }

    let primary = sanitize(profile.primary_color.as_str());
    let secondary = sanitize(profile.secondary_color.as_str());
    let accent = sanitize(profile.accent_color.as_str());
    let font = sanitize(&profile.font_family);

    let mut parts = Vec::new();
    parts.push("<brand_style_guide>".to_string());

    parts.push(format!(
        "COLOR PALETTE:\n  - Primary Color: {}\n  - Secondary Color: {}\n  - Accent Color: {}",
        primary, secondary, accent
    ));

    parts.push(format!("TYPOGRAPHY:\n  - Font Family: {}", font));

    let logo_section = match &profile.logo_ref {
        Some(logo) => existing_logo_instructions(&sanitize(&logo.virtual_path)),
        None => synthesize_logo_instructions(&primary, &font),
    };
    parts.push(format!(
        "<brand_logo_instructions>\n\
         You MUST ALWAYS create an assets folder in the project (public/assets/ or src/assets/ depending on the project structure).\n\n\
         {}\n\n\
         REGARDLESS OF THE LOGO SOURCE:\n\
         - ALWAYS reference the logo in the header, navbar and footer\n\
         - ALWAYS size and position the logo according to design best practices\n\
         - Provide a fallback so the UI does not break if the logo fails to load\n\
         </brand_logo_instructions>",
        logo_section
    ));

    parts.push(DESIGN_PRINCIPLES.to_string());
    parts.push(ADHERENCE_DIRECTIVE.to_string());
    parts.push("</brand_style_guide>".to_string());

    parts.join("\n\n")
}

/// System prompt for one chat turn: the base prompt followed by the brand
/// block, if any.
pub fn build_system_prompt(base: &str, profile: &BrandingProfile) -> String {
    let block = render_brand_block(profile);
    if block.is_empty() {
        return base.to_string();
    }
    format!("{}\n\n{}", base.trim_end(), block)
}

fn existing_logo_instructions(virtual_path: &str) -> String {
    format!(
        "{}:\n\
         - The logo is kept in the browser's asset store under the virtual path {}\n\
         - Create src/utils/logo-loader.js exporting an async loadLogo(path) that asks window.getLogoByPath(path) for the stored asset and returns its dataUrl, falling back to /assets/logo.svg\n\
         - Create a Logo component that calls loadLogo with exactly {} and renders the result in an img element\n\
         - Do NOT draw a replacement logo",
        EXISTING_LOGO_MARKER, virtual_path, virtual_path
    )
}

fn synthesize_logo_instructions(primary: &str, font: &str) -> String {
    format!(
        "{}:\n\
         - You MUST generate a simple SVG logo based on the project's purpose and the brand colors\n\
         - Save the generated logo in the assets folder as logo.svg\n\
         - Use {} as the main color of the logo and a contrasting color (typically #FFFFFF) for inner text or shapes\n\
         - Set any text in the logo in {}, sans-serif",
        SYNTHESIZE_LOGO_MARKER, primary, font
    )
}

// The surrounding prompt fences code with backticks.
fn sanitize(value: &str) -> String {
    value.replace('`', "'")
}

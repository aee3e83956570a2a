/*!
ToolName enum for the first CLI positional.

Variants:
  klaviyo / mailchimp / calendly / tiktok-ads / paddle / marketo

Helpers:
  - variants()
  - from_str_ci()
  - from_program()  (busybox-style: `klaviyo` symlink -> martech klaviyo)
  - spec()
*/

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use crate::tools::{self, ToolSpec};

/// Wrapped API selected on the command line.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ToolName {
    Klaviyo,
    Mailchimp,
    Calendly,
    /// TikTok Ads (also accepted as `tiktok`)
    #[value(name = "tiktok-ads", alias = "tiktok")]
    TiktokAds,
    Paddle,
    Marketo,
}

impl ToolName {
    pub const fn variants() -> &'static [ToolName] {
        &[
            ToolName::Klaviyo,
            ToolName::Mailchimp,
            ToolName::Calendly,
            ToolName::TiktokAds,
            ToolName::Paddle,
            ToolName::Marketo,
        ]
    }

    pub fn from_str_ci(s: &str) -> Option<Self> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "klaviyo" => Some(ToolName::Klaviyo),
            "mailchimp" => Some(ToolName::Mailchimp),
            "calendly" => Some(ToolName::Calendly),
            "tiktok-ads" | "tiktok" => Some(ToolName::TiktokAds),
            "paddle" => Some(ToolName::Paddle),
            "marketo" => Some(ToolName::Marketo),
            _ => None,
        }
    }

    /// Tool implied by the executable name (`argv[0]`), if any.
    pub fn from_program(program: &OsStr) -> Option<Self> {
        let stem = Path::new(program).file_stem()?.to_str()?;
        Self::from_str_ci(stem)
    }

    pub fn spec(&self) -> &'static ToolSpec {
        match self {
            ToolName::Klaviyo => &tools::klaviyo::TOOL,
            ToolName::Mailchimp => &tools::mailchimp::TOOL,
            ToolName::Calendly => &tools::calendly::TOOL,
            ToolName::TiktokAds => &tools::tiktok::TOOL,
            ToolName::Paddle => &tools::paddle::TOOL,
            ToolName::Marketo => &tools::marketo::TOOL,
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().name)
    }
}

/* --------------------------------- Tests ---------------------------------- */

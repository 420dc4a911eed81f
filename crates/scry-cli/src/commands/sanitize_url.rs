use clap::Args;
use scry_core::url::Url;
use scry_privacy::sanitize_url;

#[derive(Args)]
pub struct SanitizeUrlCommand {
    /// Absolute URL, or a relative one together with --base
    pub url: String,

    /// Page URL relative URLs are resolved against
    #[arg(long)]
    pub base: Option<String>,
}

impl SanitizeUrlCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let base = self
            .base
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| anyhow::anyhow!("Invalid --base URL: {}", e))?;
        println!("{}", sanitize_url(&self.url, base.as_ref()));
        Ok(())
    }
}

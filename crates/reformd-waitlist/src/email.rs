//! Verification link construction, email rendering, and redirect
//! targets.

/// `{base}{verify_path}?token={token}`. Tokens are hex, so they need
/// no escaping.
pub fn verification_link(base: &str, verify_path: &str, token: &str) -> String {
    format!("{base}{verify_path}?token={token}")
}

/// `{base}{redirect_path}?verified={flag}`.
pub fn verification_redirect(base: &str, redirect_path: &str, flag: &str) -> String {
    format!("{base}{redirect_path}?verified={flag}")
}

/// HTML body of the confirmation email.
pub fn render_verification_email(link: &str, expires_in_hours: u64) -> String {
    format!(
        r#"
  <div style="font-family: ui-sans-serif, system-ui, -apple-system, Segoe UI, Roboto, Helvetica, Arial; line-height:1.5; color:#111;">
    <h2 style="margin:0 0 12px;">Confirm your Re:Formd waitlist spot</h2>
    <p style="margin:0 0 16px;">Click the button below to verify your email. You're not added until you confirm.</p>
    <p style="margin:0 0 18px;">
      <a href="{link}"
         style="display:inline-block;background:#111;color:#fff;text-decoration:none;padding:12px 18px;border-radius:12px;font-weight:600;">
        Verify email
      </a>
    </p>
    <p style="margin:0 0 8px;font-size:12px;color:#555;">Link expires in {expires_in_hours} hours.</p>
    <p style="margin:0;font-size:12px;color:#777;">If you didn't request this, ignore this email.</p>
  </div>"#
    )
}

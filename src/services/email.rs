// src/services/email.rs
//! Email content for every notification the service sends

use crate::common::helpers::html_escape;

use super::mailer::OutgoingEmail;

/// Shared document shell so every message renders with the same styling
fn wrap_html(title: &str, accent: &str, inner: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: {accent}; color: white; padding: 20px; text-align: center; }}
        .content {{ padding: 20px; background-color: #f9f9f9; }}
        .message-box {{ margin: 20px 0; padding: 15px; background-color: #f5f5f5; border-radius: 4px; white-space: pre-wrap; }}
        .button {{ display: inline-block; padding: 12px 24px; background-color: {accent}; color: white; text-decoration: none; border-radius: 5px; margin: 10px 0; }}
        .footer {{ padding: 20px; text-align: center; font-size: 12px; color: #666; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{title}</h1>
        </div>
        <div class="content">
{inner}
        </div>
    </div>
</body>
</html>"#,
        accent = accent,
        title = html_escape(title),
        inner = inner
    )
}

/// Admin notification for a freshly submitted profile. Replies go
/// straight to the submitter.
pub fn submission_notification(
    admin_email: &str,
    submitter_email: &str,
    linkedin_url: &str,
    message: &str,
) -> OutgoingEmail {
    let inner = format!(
        r#"            <p><strong>From:</strong> {}</p>
            <p><strong>URL:</strong> {}</p>
            <div class="message-box"><strong>Message:</strong><br>{}</div>
            <p class="footer">This message was submitted via the form on your website.
            You can reply directly to this email to respond to the user.</p>"#,
        html_escape(submitter_email),
        html_escape(linkedin_url),
        html_escape(message)
    );

    let text = format!(
        "New Form Submission\n\nFrom: {}\nURL: {}\n\nMessage:\n{}\n\nThis message was submitted via the form on your website.\n",
        submitter_email, linkedin_url, message
    );

    OutgoingEmail {
        to: admin_email.to_string(),
        reply_to: Some(submitter_email.to_string()),
        subject: "New Message from Website User".to_string(),
        text_body: text,
        html_body: wrap_html("New Form Submission", "#328E6E", &inner),
    }
}

/// Admin feedback delivered to the person who submitted the profile
pub fn admin_reply(
    submitter_email: &str,
    reply_text: &str,
    original_message: &str,
    linkedin_url: &str,
) -> OutgoingEmail {
    let inner = format!(
        r#"            <p>Hello,</p>
            <p>We've reviewed your LinkedIn profile submission and provided feedback.</p>
            <div class="message-box"><strong>Admin Reply:</strong><br>{}</div>
            <p><strong>Original Message:</strong> {}</p>
            <p><strong>LinkedIn URL:</strong> {}</p>
            <p>Thank you for using our service.</p>"#,
        html_escape(reply_text),
        html_escape(original_message),
        html_escape(linkedin_url)
    );

    let text = format!(
        "Hello,\n\nWe've reviewed your LinkedIn profile submission and provided feedback.\n\nAdmin Reply: {}\n\nOriginal Message: {}\nLinkedIn URL: {}\n\nThank you for using our service.\n",
        reply_text, original_message, linkedin_url
    );

    OutgoingEmail {
        to: submitter_email.to_string(),
        reply_to: None,
        subject: "Response to your LinkedIn Profile Submission".to_string(),
        text_body: text,
        html_body: wrap_html("Your Profile Review", "#4F46E5", &inner),
    }
}

pub fn email_verification(user_email: &str, verification_url: &str) -> OutgoingEmail {
    let inner = format!(
        r#"            <p>Hello,</p>
            <p>Thank you for registering. Please verify your email by visiting:</p>
            <p><a class="button" href="{url}">Verify email</a></p>
            <p>{url}</p>
            <p>This link will expire in 24 hours.</p>
            <p>If you didn't register on our site, please ignore this email.</p>"#,
        url = html_escape(verification_url)
    );

    let text = format!(
        "Hello,\n\nThank you for registering. Please verify your email by visiting:\n\n{}\n\nThis link will expire in 24 hours.\n\nIf you didn't register on our site, please ignore this email.\n",
        verification_url
    );

    OutgoingEmail {
        to: user_email.to_string(),
        reply_to: None,
        subject: "Verify your email address".to_string(),
        text_body: text,
        html_body: wrap_html("Verify your email", "#8B5CF6", &inner),
    }
}

pub fn password_reset(user_email: &str, reset_url: &str) -> OutgoingEmail {
    let inner = format!(
        r#"            <p>Please click the following link to reset your password:</p>
            <p><a class="button" href="{url}">Reset password</a></p>
            <p>{url}</p>
            <p>This link will expire in one hour. If you didn't request a reset, you can ignore this email.</p>"#,
        url = html_escape(reset_url)
    );

    OutgoingEmail {
        to: user_email.to_string(),
        reply_to: None,
        subject: "Password Reset Request".to_string(),
        text_body: format!(
            "Please click the following link to reset your password: {}\n",
            reset_url
        ),
        html_body: wrap_html("Password Reset", "#6B7280", &inner),
    }
}

// Entrega de email via SMTP (OTP de reset e credenciais de staff).
// Configuração pelo .env: SMTP_HOST, SMTP_PORT, SMTP_USERNAME, SMTP_PASSWORD,
// SMTP_FROM.

use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::env;

fn build_mailer() -> Result<AsyncSmtpTransport<Tokio1Executor>, String> {
    let host = env::var("SMTP_HOST").map_err(|_| "SMTP_HOST not configured".to_string())?;
    let port: u16 = env::var("SMTP_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(587);
    let username =
        env::var("SMTP_USERNAME").map_err(|_| "SMTP_USERNAME not configured".to_string())?;
    let password =
        env::var("SMTP_PASSWORD").map_err(|_| "SMTP_PASSWORD not configured".to_string())?;

    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
        .map_err(|e| format!("SMTP config error: {}", e))?
        .port(port)
        .credentials(Credentials::new(username, password))
        .build();

    Ok(mailer)
}

fn from_address() -> String {
    env::var("SMTP_FROM").unwrap_or_else(|_| "Charm Cards <no-reply@charmcards.app>".to_string())
}

async fn send_plain(to: &str, subject: &str, body: String) -> Result<(), String> {
    let message = Message::builder()
        .from(
            from_address()
                .parse()
                .map_err(|e| format!("Invalid from address: {}", e))?,
        )
        .to(to
            .parse()
            .map_err(|e| format!("Invalid recipient address: {}", e))?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| format!("Failed to build message: {}", e))?;

    build_mailer()?
        .send(message)
        .await
        .map_err(|e| format!("Failed to send email: {}", e))?;

    Ok(())
}

fn otp_body(username: &str, otp: &str) -> String {
    format!(
        "Hi {},\n\nYour password reset code is: {}\n\nIt expires in 10 minutes. \
         If you didn't request this, you can ignore this email.\n\n— Charm Cards",
        username, otp
    )
}

fn staff_credentials_body(username: &str, email: &str, temp_password: &str) -> String {
    format!(
        "Hi {},\n\nA staff account was created for you on Charm Cards.\n\n\
         Login: {}\nTemporary password: {}\n\n\
         Please change your password after the first login.\n\n— Charm Cards",
        username, email, temp_password
    )
}

pub async fn send_otp_email(to: &str, username: &str, otp: &str) -> Result<(), String> {
    send_plain(to, "Your Charm Cards password reset code", otp_body(username, otp)).await
}

pub async fn send_staff_credentials_email(
    to: &str,
    username: &str,
    temp_password: &str,
) -> Result<(), String> {
    send_plain(
        to,
        "Your Charm Cards staff account",
        staff_credentials_body(username, to, temp_password),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_body_contains_code() {
        let body = otp_body("alice", "123456");
        assert!(body.contains("123456"));
        assert!(body.contains("alice"));
        assert!(body.contains("10 minutes"));
    }

    #[test]
    fn test_staff_credentials_body() {
        let body = staff_credentials_body("bob", "b@x.com", "tmp-pass");
        assert!(body.contains("b@x.com"));
        assert!(body.contains("tmp-pass"));
    }
}

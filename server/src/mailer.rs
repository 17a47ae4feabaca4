//! OTP delivery over SMTP.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    transport::smtp::authentication::Credentials,
};

use crate::{config::Config, error::AppError};

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl Mailer {
    pub fn new(config: &Config) -> Self {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .expect("SMTP misconfigured!")
            .credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Self {
            transport,
            from: config.mail_from.clone(),
        }
    }

    pub async fn send_otp(&self, to: &str, otp: &str) -> Result<(), AppError> {
        let email = Message::builder()
            .from(self.from.parse().map_err(|_| {
                AppError::ServiceUnavailable("Mail sender misconfigured".into())
            })?)
            .to(to
                .parse()
                .map_err(|_| AppError::Validation("Please enter a valid email".into()))?)
            .subject("Your OTP Verification Code")
            .body(format!("Your OTP code is: {otp}"))
            .map_err(|e| AppError::ServiceUnavailable(format!("Could not build email: {e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("Could not send OTP email: {e}")))?;

        Ok(())
    }
}

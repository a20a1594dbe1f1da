use clap::{Args, Subcommand};
use storefront_app::{
    auth::{self, save_session},
    context::AppContext,
};

#[derive(Debug, Args)]
pub(crate) struct LoginCommand {
    #[command(subcommand)]
    command: LoginSubcommand,
}

#[derive(Debug, Subcommand)]
enum LoginSubcommand {
    /// Send a one-time password to a phone number
    RequestOtp(PhoneArgs),

    /// Sign in with the one-time password
    Verify(VerifyArgs),
}

#[derive(Debug, Args)]
struct PhoneArgs {
    #[arg(long)]
    phone: String,
}

#[derive(Debug, Args)]
struct VerifyArgs {
    #[arg(long)]
    phone: String,

    #[arg(long)]
    otp: String,
}

pub(crate) async fn login(command: LoginCommand, context: &mut AppContext) -> Result<(), String> {
    match command.command {
        LoginSubcommand::RequestOtp(args) => {
            context
                .auth
                .request_otp(&args.phone)
                .await
                .map_err(|error| format!("Failed to send OTP: {error}"))?;

            println!("OTP sent to {}", args.phone);
        }
        LoginSubcommand::Verify(args) => {
            let session = context
                .auth
                .sign_in(&args.phone, &args.otp)
                .await
                .map_err(|error| format!("Failed to verify OTP: {error}"))?;

            save_session(&mut context.sessions, &session)
                .map_err(|error| format!("failed to save session: {error}"))?;

            match session.user.as_ref().and_then(|user| user.name.as_deref()) {
                Some(name) => println!("signed in as {name}"),
                None => println!("signed in"),
            }
        }
    }

    Ok(())
}

pub(crate) fn logout(context: &mut AppContext) -> Result<(), String> {
    auth::logout(&mut context.sessions, &mut context.cart)
        .map_err(|error| format!("failed to sign out: {error}"))?;

    println!("signed out");

    Ok(())
}

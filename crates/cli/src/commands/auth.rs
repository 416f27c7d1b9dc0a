//! Session commands.

use autoparts_storefront::Result;

use super::{App, output};

/// Sign in and store the session.
pub async fn login(app: &App, email: &str, password: &str) -> Result<()> {
    let session = app.api.sign_in(email, password).await?;
    output::line(&format!("Sesión iniciada como {}", session.user.display_name()));
    Ok(())
}

pub async fn register(app: &App, name: &str, email: &str, password: &str) -> Result<()> {
    let session = app.api.register(name, email, password).await?;
    output::line(&format!("Cuenta creada para {}", session.user.email));
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    app.api.sign_out()?;
    output::line("Sesión cerrada");
    Ok(())
}

pub fn whoami(app: &App) -> Result<()> {
    match app.api.current_session()? {
        Some(session) => output::user(&session.user),
        None => output::line("No has iniciado sesión"),
    }
    Ok(())
}

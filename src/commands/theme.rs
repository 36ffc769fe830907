use crate::app::App;
use crate::args::Theme;
use crate::commands::Out;
use crate::Result;

/// Stores the dark mode preference. Returns whether dark mode is now on.
pub async fn theme(app: &mut App, theme: Theme) -> Result<Out<bool>> {
    let dark_mode = match theme {
        Theme::Dark => true,
        Theme::Light => false,
        Theme::Toggle => !app.session().dark_mode(),
    };
    app.session_mut().set_dark_mode(dark_mode);
    app.save_session().await?;
    let message = if dark_mode {
        "Dark mode is on"
    } else {
        "Dark mode is off"
    };
    Ok(Out::new(message, dark_mode))
}

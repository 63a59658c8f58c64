//! Window management using GLFW
//!
//! Creates a resizable window without a client API and translates GLFW events
//! into [`AppEvent`]s. The content scale doubles as the device pixel ratio.

use thiserror::Error;

use crate::events::{AppEvent, KeyCode, MouseButton};

/// Window errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// The window could not be created
    #[error("Window creation failed")]
    CreationFailed,
}

/// Result alias for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Native window
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl Window {
    /// Create a resizable window with input polling enabled
    pub fn new(title: &str, width: u32, height: u32) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_size_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_mouse_button_polling(true);
        window.set_scroll_polling(true);
        window.set_content_scale_polling(true);

        log::info!("Created {}x{} window '{}'", width, height, title);
        Ok(Self { glfw, window, events })
    }

    /// Whether the user asked to close the window
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Request (or withdraw a request) to close
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Pump the OS event queue and translate what arrived
    pub fn poll_events(&mut self) -> Vec<AppEvent> {
        self.glfw.poll_events();
        glfw::flush_messages(&self.events)
            .filter_map(|(_, event)| translate_event(&event))
            .collect()
    }

    /// Window size in screen coordinates
    pub fn size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Device pixel ratio of the monitor the window is on
    pub fn content_scale(&self) -> f32 {
        let (x, y) = self.window.get_content_scale();
        x.max(y)
    }

    /// Replace the title bar text
    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }
}

/// Map a GLFW event onto the events the viewer handles
pub fn translate_event(event: &glfw::WindowEvent) -> Option<AppEvent> {
    match *event {
        glfw::WindowEvent::Size(width, height) => Some(AppEvent::WindowResized {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        }),
        glfw::WindowEvent::ContentScale(x, y) => Some(AppEvent::ContentScaleChanged { scale: x.max(y) }),
        glfw::WindowEvent::Close => Some(AppEvent::WindowCloseRequested),
        glfw::WindowEvent::Key(key, _, action, _) => {
            let key = match key {
                glfw::Key::Tab => KeyCode::Tab,
                glfw::Key::Left => KeyCode::Left,
                glfw::Key::Right => KeyCode::Right,
                glfw::Key::Up => KeyCode::Up,
                glfw::Key::Down => KeyCode::Down,
                glfw::Key::Escape => KeyCode::Escape,
                glfw::Key::R => KeyCode::R,
                _ => return None,
            };
            Some(AppEvent::KeyInput {
                key,
                pressed: action != glfw::Action::Release,
            })
        }
        glfw::WindowEvent::MouseButton(button, action, _) => {
            let button = match button {
                glfw::MouseButton::Button1 => MouseButton::Left,
                glfw::MouseButton::Button2 => MouseButton::Right,
                glfw::MouseButton::Button3 => MouseButton::Middle,
                _ => return None,
            };
            Some(AppEvent::MouseButton {
                button,
                pressed: action == glfw::Action::Press,
            })
        }
        glfw::WindowEvent::CursorPos(x, y) => Some(AppEvent::MouseMoved { x, y }),
        glfw::WindowEvent::Scroll(delta_x, delta_y) => Some(AppEvent::MouseWheel { delta_x, delta_y }),
        _ => None,
    }
}

use teloxide::types::{KeyboardButton, KeyboardMarkup};

/// Reply-keyboard buttons of the main menu. The label is what the client sends back as text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuButton {
    CaloriesFromPhoto,
    TakePhoto,
    TrainingPrograms,
    HowToUse,
    Subscription,
    Profile,
    IqTest,
}

impl MenuButton {
    const ALL: [MenuButton; 7] = [
        MenuButton::CaloriesFromPhoto,
        MenuButton::TakePhoto,
        MenuButton::TrainingPrograms,
        MenuButton::HowToUse,
        MenuButton::Subscription,
        MenuButton::Profile,
        MenuButton::IqTest,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuButton::CaloriesFromPhoto => "🍱 Calories from a photo",
            MenuButton::TakePhoto => "📸 Take a photo",
            MenuButton::TrainingPrograms => "🏋️ Training programs",
            MenuButton::HowToUse => "📚 How to use",
            MenuButton::Subscription => "💳 Subscription",
            MenuButton::Profile => "👤 Profile",
            MenuButton::IqTest => "🧠 IQ test",
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|button| button.label() == text)
    }

    fn key(self) -> KeyboardButton {
        KeyboardButton::new(self.label())
    }
}

pub fn get_main_menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new([
        vec![MenuButton::CaloriesFromPhoto.key()],
        vec![MenuButton::TakePhoto.key(), MenuButton::TrainingPrograms.key()],
        vec![MenuButton::HowToUse.key(), MenuButton::Subscription.key()],
        vec![MenuButton::Profile.key(), MenuButton::IqTest.key()],
    ])
    .resize_keyboard()
}

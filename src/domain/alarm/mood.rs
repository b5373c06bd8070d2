//! Voice mood 语音参数与文案模板

use super::VoiceMood;

/// 声线偏好（启发式，不保证命中）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoicePreference {
    Male,
    Female,
    Any,
}

/// 情绪对应的语音合成参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodProfile {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub preference: VoicePreference,
}

impl VoiceMood {
    pub fn profile(&self) -> MoodProfile {
        let (rate, pitch, volume, preference) = match self {
            VoiceMood::DrillSergeant => (1.2, 0.8, 1.0, VoicePreference::Male),
            VoiceMood::SweetAngel => (0.9, 1.3, 0.8, VoicePreference::Female),
            VoiceMood::AnimeHero => (1.1, 1.2, 0.95, VoicePreference::Any),
            VoiceMood::SavageRoast => (1.0, 0.9, 0.9, VoicePreference::Male),
            VoiceMood::Motivational => (1.0, 1.0, 0.95, VoicePreference::Any),
            VoiceMood::Gentle => (0.8, 1.1, 0.7, VoicePreference::Female),
        };
        MoodProfile {
            rate,
            pitch,
            volume,
            preference,
        }
    }

    /// 文案模板，`{time}` 与 `{label}` 会被替换
    pub fn templates(&self) -> &'static [&'static str] {
        match self {
            VoiceMood::DrillSergeant => &[
                "WAKE UP, SOLDIER! It is {time}! {label}! Get out of that bed NOW!",
                "Rise and shine, recruit! {time} means move! {label} is waiting and so am I!",
                "On your feet! It's {time}! Nobody ever won a war in bed! {label}, MOVE!",
                "Drop the blanket and give me twenty! It's {time}! {label} starts NOW!",
                "This is not a drill! It's {time}! {label}! Boots on the floor in five, four, three!",
                "Did I say you could snooze? It's {time}! Report for {label} immediately!",
            ],
            VoiceMood::SweetAngel => &[
                "Good morning, sunshine. It's {time}, time for {label}. You've got this.",
                "Hello lovely, it's {time}. Take a deep breath, {label} is next.",
                "Wake up sweetly, it's {time}. Today is full of good things, starting with {label}.",
                "Rise gently, dear. It's {time}, and {label} is waiting for your lovely smile.",
                "It's {time}, my dear. The world is brighter with you awake. Time for {label}.",
                "Sweet dreams are over for now. It's {time}, and {label} is ready for you.",
            ],
            VoiceMood::AnimeHero => &[
                "The hour has come! It's {time}! Your quest awaits: {label}!",
                "Awaken, hero! At {time} the legend begins! Your mission: {label}!",
                "This is your power-up moment! {time}! Charge into {label}!",
                "Your final form awakens at {time}! Unleash it on {label}!",
                "Believe in the you that believes in yourself! It's {time}! Onward to {label}!",
                "The opening theme is playing! It's {time}! Episode one: {label}!",
            ],
            VoiceMood::SavageRoast => &[
                "Oh look, it's {time} and you're still horizontal. {label} won't do itself.",
                "Congratulations, you've mastered sleeping. It's {time}. Try {label} for a change.",
                "It's {time}. Your bed called, it wants a break from you. Go do {label}.",
                "Wow, {time} already and you've achieved nothing. {label} might fix that.",
                "Your snooze button filed a complaint. It's {time}. Go handle {label}.",
                "It's {time}. Even your coffee is more awake than you. {label}, let's go.",
            ],
            VoiceMood::Motivational => &[
                "It's {time}. Today is your day. Let's crush {label}!",
                "Good morning, champion! It's {time}. Every great day starts now. {label} awaits!",
                "Rise up! It's {time}. Small steps, big wins. First up: {label}.",
                "It's {time}. Yesterday is gone, today is yours. Go own {label}!",
                "You were built for this. It's {time}, and {label} is your next win.",
                "Winners get up at {time}. Show up for {label} and the rest will follow.",
            ],
            VoiceMood::Gentle => &[
                "Good morning. It's {time}. Whenever you're ready, it's time for {label}.",
                "Hello there. It's {time}. Ease into the day, {label} is coming up.",
                "It's {time}. Stretch softly and take your time. {label} is next.",
                "It's {time}. Open your eyes slowly, there's no rush. {label} will be there.",
                "Good morning, it's {time}. A calm breath in, a calm breath out. Then {label}.",
                "The morning is quiet at {time}. When you feel ready, {label} is waiting.",
            ],
        }
    }
}

/// 用闹钟时间与标签填充模板
pub fn render_template(template: &str, time: &str, label: &str) -> String {
    let label = if label.trim().is_empty() {
        "your alarm"
    } else {
        label.trim()
    };
    template.replace("{time}", time).replace("{label}", label)
}

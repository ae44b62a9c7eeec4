pub mod elevenlabs;
pub mod groq;
pub mod pexels;

#[cfg(test)]
pub(crate) mod canned;

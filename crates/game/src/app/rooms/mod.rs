mod splash;
mod title;

pub(crate) use splash::Splash;
pub(crate) use title::Title;

#[cfg(test)]
mod tests;

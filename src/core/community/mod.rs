pub mod bindings;
pub mod greeter;
pub mod ports;

#[cfg(test)]
pub mod testing;

pub use bindings::ChannelBindings;
pub use greeter::greet_member;
pub use ports::{
    Card, CardField, ChannelPoster, GuildDirectory, GuildGateway, MemberRef, MemberResolver,
    OutboundMessage, PlatformError, RoleMutator,
};
